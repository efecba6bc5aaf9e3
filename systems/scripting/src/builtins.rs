//! Native words available to every script.
//!
//! Stack effects are written `( before -- after )` with the top of the stack
//! on the right. Actuation words never fault on refused actions: they push a
//! result the script can branch on instead.

use hexbots_core::Command;
use hexbots_system_mailbox::send_message;

use crate::{dictionary::Dictionary, machine::Machine, Flow, Value, WordFault};

type WordResult = Result<Flow, WordFault>;

pub(crate) fn register(dictionary: &mut Dictionary) {
    // stack
    dictionary.insert_builtin("dup", dup);
    dictionary.insert_builtin("drop", drop_top);
    dictionary.insert_builtin("swap", swap);
    dictionary.insert_builtin("over", over);
    dictionary.insert_builtin("rot", rot);
    dictionary.insert_builtin("nip", nip);
    dictionary.insert_builtin("depth", depth);
    dictionary.insert_builtin("clear", clear);

    // arithmetic
    dictionary.insert_builtin("+", add);
    dictionary.insert_builtin("-", subtract);
    dictionary.insert_builtin("*", multiply);
    dictionary.insert_builtin("/", divide);
    dictionary.insert_builtin("mod", remainder);
    dictionary.insert_builtin("negate", negate);
    dictionary.insert_builtin("abs", absolute);
    dictionary.insert_builtin("min", minimum);
    dictionary.insert_builtin("max", maximum);

    // comparison and logic
    dictionary.insert_builtin("=", equal);
    dictionary.insert_builtin("<>", not_equal);
    dictionary.insert_builtin("<", less);
    dictionary.insert_builtin(">", greater);
    dictionary.insert_builtin("<=", less_or_equal);
    dictionary.insert_builtin(">=", greater_or_equal);
    dictionary.insert_builtin("and", and);
    dictionary.insert_builtin("or", or);
    dictionary.insert_builtin("not", not);

    // text
    dictionary.insert_builtin("concat", concat);
    dictionary.insert_builtin(">num", to_number);
    dictionary.insert_builtin(".", print);

    // self queries
    dictionary.insert_builtin("health", health);
    dictionary.insert_builtin("moves", moves);
    dictionary.insert_builtin("range", range);
    dictionary.insert_builtin("attack", attack);
    dictionary.insert_builtin("facing", facing);
    dictionary.insert_builtin("turns", turns);
    dictionary.insert_builtin("hasshot", has_shot);
    dictionary.insert_builtin("myid", my_id);

    // actuation
    dictionary.insert_builtin("move", move_piece);
    dictionary.insert_builtin("shoot", shoot);
    dictionary.insert_builtin("turn", turn);

    // sensing
    dictionary.insert_builtin("look", look);
    dictionary.insert_builtin("identify", identify);
    dictionary.insert_builtin("enemies", enemies);

    // messaging
    dictionary.insert_builtin("send", send);
    dictionary.insert_builtin("receive", receive);
    dictionary.insert_builtin("hasmessage", has_message);
    dictionary.insert_builtin("clearmail", clear_mail);

    dictionary.insert_builtin("end", end);
}

fn dup(machine: &mut Machine<'_>) -> WordResult {
    let top = machine.peek(0)?;
    machine.push(top)?;
    Ok(Flow::Continue)
}

fn drop_top(machine: &mut Machine<'_>) -> WordResult {
    let _ = machine.pop()?;
    Ok(Flow::Continue)
}

fn swap(machine: &mut Machine<'_>) -> WordResult {
    let (first, second) = machine.pop_pair()?;
    machine.push(second)?;
    machine.push(first)?;
    Ok(Flow::Continue)
}

fn over(machine: &mut Machine<'_>) -> WordResult {
    let below = machine.peek(1)?;
    machine.push(below)?;
    Ok(Flow::Continue)
}

/// `( a b c -- b c a )`
fn rot(machine: &mut Machine<'_>) -> WordResult {
    let _ = machine.peek(2)?;
    let (second, third) = machine.pop_pair()?;
    let first = machine.pop()?;
    machine.push(second)?;
    machine.push(third)?;
    machine.push(first)?;
    Ok(Flow::Continue)
}

fn nip(machine: &mut Machine<'_>) -> WordResult {
    let (_, second) = machine.pop_pair()?;
    machine.push(second)?;
    Ok(Flow::Continue)
}

fn depth(machine: &mut Machine<'_>) -> WordResult {
    let depth = i64::try_from(machine.depth()).map_err(|_| WordFault::Overflow)?;
    machine.push(depth)?;
    Ok(Flow::Continue)
}

fn clear(machine: &mut Machine<'_>) -> WordResult {
    machine.clear_stack();
    Ok(Flow::Continue)
}

fn arithmetic(
    machine: &mut Machine<'_>,
    operation: impl FnOnce(i64, i64) -> Result<i64, WordFault>,
) -> WordResult {
    let (left, right) = machine.pop_int_pair()?;
    machine.push(operation(left, right)?)?;
    Ok(Flow::Continue)
}

fn add(machine: &mut Machine<'_>) -> WordResult {
    arithmetic(machine, |left, right| {
        left.checked_add(right).ok_or(WordFault::Overflow)
    })
}

fn subtract(machine: &mut Machine<'_>) -> WordResult {
    arithmetic(machine, |left, right| {
        left.checked_sub(right).ok_or(WordFault::Overflow)
    })
}

fn multiply(machine: &mut Machine<'_>) -> WordResult {
    arithmetic(machine, |left, right| {
        left.checked_mul(right).ok_or(WordFault::Overflow)
    })
}

fn divide(machine: &mut Machine<'_>) -> WordResult {
    arithmetic(machine, |left, right| {
        if right == 0 {
            return Err(WordFault::DivisionByZero);
        }
        left.checked_div(right).ok_or(WordFault::Overflow)
    })
}

fn remainder(machine: &mut Machine<'_>) -> WordResult {
    arithmetic(machine, |left, right| {
        if right == 0 {
            return Err(WordFault::DivisionByZero);
        }
        left.checked_rem(right).ok_or(WordFault::Overflow)
    })
}

fn negate(machine: &mut Machine<'_>) -> WordResult {
    let value = machine.pop_int()?;
    machine.push(value.checked_neg().ok_or(WordFault::Overflow)?)?;
    Ok(Flow::Continue)
}

fn absolute(machine: &mut Machine<'_>) -> WordResult {
    let value = machine.pop_int()?;
    machine.push(value.checked_abs().ok_or(WordFault::Overflow)?)?;
    Ok(Flow::Continue)
}

fn minimum(machine: &mut Machine<'_>) -> WordResult {
    arithmetic(machine, |left, right| Ok(left.min(right)))
}

fn maximum(machine: &mut Machine<'_>) -> WordResult {
    arithmetic(machine, |left, right| Ok(left.max(right)))
}

fn equal(machine: &mut Machine<'_>) -> WordResult {
    let (left, right) = machine.pop_pair()?;
    machine.push_flag(left == right)?;
    Ok(Flow::Continue)
}

fn not_equal(machine: &mut Machine<'_>) -> WordResult {
    let (left, right) = machine.pop_pair()?;
    machine.push_flag(left != right)?;
    Ok(Flow::Continue)
}

fn compare(machine: &mut Machine<'_>, predicate: impl FnOnce(i64, i64) -> bool) -> WordResult {
    let (left, right) = machine.pop_int_pair()?;
    machine.push_flag(predicate(left, right))?;
    Ok(Flow::Continue)
}

fn less(machine: &mut Machine<'_>) -> WordResult {
    compare(machine, |left, right| left < right)
}

fn greater(machine: &mut Machine<'_>) -> WordResult {
    compare(machine, |left, right| left > right)
}

fn less_or_equal(machine: &mut Machine<'_>) -> WordResult {
    compare(machine, |left, right| left <= right)
}

fn greater_or_equal(machine: &mut Machine<'_>) -> WordResult {
    compare(machine, |left, right| left >= right)
}

fn and(machine: &mut Machine<'_>) -> WordResult {
    let (left, right) = machine.pop_pair()?;
    machine.push_flag(left.is_truthy() && right.is_truthy())?;
    Ok(Flow::Continue)
}

fn or(machine: &mut Machine<'_>) -> WordResult {
    let (left, right) = machine.pop_pair()?;
    machine.push_flag(left.is_truthy() || right.is_truthy())?;
    Ok(Flow::Continue)
}

fn not(machine: &mut Machine<'_>) -> WordResult {
    let value = machine.pop()?;
    machine.push_flag(!value.is_truthy())?;
    Ok(Flow::Continue)
}

fn concat(machine: &mut Machine<'_>) -> WordResult {
    let (left, right) = machine.pop_pair()?;
    let mut text = left.into_text();
    text.push_str(&right.into_text());
    machine.push(text)?;
    Ok(Flow::Continue)
}

/// Text that does not parse as an integer becomes `0`.
fn to_number(machine: &mut Machine<'_>) -> WordResult {
    let number = match machine.pop()? {
        Value::Int(value) => value,
        Value::Text(text) => text.trim().parse().unwrap_or(0),
    };
    machine.push(number)?;
    Ok(Flow::Continue)
}

fn print(machine: &mut Machine<'_>) -> WordResult {
    let value = machine.pop()?;
    log::info!(target: "hexbots::script", "{}: {value}", machine.piece.id());
    Ok(Flow::Continue)
}

fn health(machine: &mut Machine<'_>) -> WordResult {
    let health = machine.piece.health();
    machine.push(i64::from(health))?;
    Ok(Flow::Continue)
}

fn moves(machine: &mut Machine<'_>) -> WordResult {
    let movement = machine.piece.movement();
    machine.push(i64::from(movement))?;
    Ok(Flow::Continue)
}

fn range(machine: &mut Machine<'_>) -> WordResult {
    let range = machine.piece.stats().range;
    machine.push(i64::from(range))?;
    Ok(Flow::Continue)
}

fn attack(machine: &mut Machine<'_>) -> WordResult {
    let attack = machine.piece.stats().attack;
    machine.push(i64::from(attack))?;
    Ok(Flow::Continue)
}

fn facing(machine: &mut Machine<'_>) -> WordResult {
    let rotation = machine.piece.rotation();
    machine.push(i64::from(rotation))?;
    Ok(Flow::Continue)
}

fn turns(machine: &mut Machine<'_>) -> WordResult {
    let turns = machine.piece.turns_taken();
    machine.push(i64::from(turns))?;
    Ok(Flow::Continue)
}

fn has_shot(machine: &mut Machine<'_>) -> WordResult {
    let has_shot = machine.piece.has_shot();
    machine.push_flag(has_shot)?;
    Ok(Flow::Continue)
}

fn my_id(machine: &mut Machine<'_>) -> WordResult {
    let id = machine.piece.id().to_string();
    machine.push(id)?;
    Ok(Flow::Continue)
}

/// `( spaces dir -- moved )`
///
/// Walks one hex at a time and stops before the board edge, before an
/// occupied hex, or when movement runs out.
fn move_piece(machine: &mut Machine<'_>) -> WordResult {
    let (spaces, direction) = machine.pop_int_pair()?;
    let heading = machine.heading(direction);
    let start = machine.piece.position();
    let budget = u32::try_from(spaces.max(0))
        .unwrap_or(u32::MAX)
        .min(machine.piece.movement());

    let mut walked = 0;
    for step in 1..=budget {
        let cell = start.offset(heading, step as i32);
        if !machine.board.contains(cell) || machine.other_occupant(cell).is_some() {
            break;
        }
        walked = step;
    }

    if walked == 0 {
        machine.push(0_i64)?;
        return Ok(Flow::Continue);
    }

    match machine.piece.update_move(walked, heading) {
        Ok(()) => machine.push(i64::from(walked))?,
        Err(error) => {
            log::debug!("{} could not move: {error}", machine.piece.id());
            machine.push(0_i64)?;
        }
    }
    Ok(Flow::Continue)
}

/// `( distance dir -- hit )`
///
/// Out-of-range shots are refused without spending the turn's shot. A shot
/// at an empty or downed hex is spent but hits nothing.
fn shoot(machine: &mut Machine<'_>) -> WordResult {
    let (distance, direction) = machine.pop_int_pair()?;
    let range = i64::from(machine.piece.stats().range);
    if distance < 1 || distance > range {
        machine.push(0_i64)?;
        return Ok(Flow::Continue);
    }

    let damage = match machine.piece.update_shoot() {
        Ok(damage) => damage,
        Err(error) => {
            log::debug!("{} could not shoot: {error}", machine.piece.id());
            machine.push(0_i64)?;
            return Ok(Flow::Continue);
        }
    };

    let heading = machine.heading(direction);
    let cell = machine.piece.position().offset(heading, distance as i32);
    let target = machine
        .other_occupant(cell)
        .filter(|snapshot| snapshot.active)
        .map(|snapshot| snapshot.id.clone());

    match target {
        Some(target) => {
            machine.commands.push(Command::ResolveShot {
                attacker: machine.piece.id().clone(),
                target,
                damage,
            });
            machine.push(1_i64)?;
        }
        None => machine.push(0_i64)?,
    }
    Ok(Flow::Continue)
}

fn turn(machine: &mut Machine<'_>) -> WordResult {
    let steps = machine.pop_int()?;
    machine.piece.rotate(steps);
    Ok(Flow::Continue)
}

/// `( dir -- distance )`, `0` when the line of sight reaches the edge.
fn look(machine: &mut Machine<'_>) -> WordResult {
    let direction = machine.pop_int()?;
    let heading = machine.heading(direction);
    let start = machine.piece.position();

    let mut step: i64 = 1;
    let mut cell = start.neighbor(heading);
    let mut seen: i64 = 0;
    while machine.board.contains(cell) {
        if machine.other_occupant(cell).is_some() {
            seen = step;
            break;
        }
        step += 1;
        cell = cell.neighbor(heading);
    }

    machine.push(seen)?;
    Ok(Flow::Continue)
}

/// `( distance dir -- id )`, `""` when nobody stands there.
fn identify(machine: &mut Machine<'_>) -> WordResult {
    let (distance, direction) = machine.pop_int_pair()?;
    let reach = 2 * i64::from(machine.board.radius());
    let steps = i32::try_from(distance)
        .ok()
        .filter(|_| (1..=reach).contains(&distance));
    let id = steps.and_then(|steps| {
        let heading = machine.heading(direction);
        let cell = machine.piece.position().offset(heading, steps);
        machine
            .other_occupant(cell)
            .map(|snapshot| snapshot.id.to_string())
    });

    machine.push(id.unwrap_or_default())?;
    Ok(Flow::Continue)
}

/// `( -- n )` active enemies within the piece's range.
fn enemies(machine: &mut Machine<'_>) -> WordResult {
    let position = machine.piece.position();
    let range = machine.piece.stats().range;
    let team = machine.piece.team();
    let count = machine
        .board
        .within(position, range)
        .filter(|snapshot| snapshot.active && &snapshot.team != team)
        .count();

    let count = i64::try_from(count).map_err(|_| WordFault::Overflow)?;
    machine.push(count)?;
    Ok(Flow::Continue)
}

/// `( payload recipient -- ok )`
fn send(machine: &mut Machine<'_>) -> WordResult {
    let recipient = machine.pop_text()?;
    let payload = machine.pop_text()?;
    let delivered = match send_message(
        machine.piece.id(),
        &mut *machine.mailboxes,
        &recipient,
        &payload,
    ) {
        Ok(()) => true,
        Err(error) => {
            log::debug!("{} could not send: {error}", machine.piece.id());
            false
        }
    };
    machine.push_flag(delivered)?;
    Ok(Flow::Continue)
}

/// `( sender -- payload )`, `""` when nothing from `sender` is queued.
fn receive(machine: &mut Machine<'_>) -> WordResult {
    let sender = machine.pop_text()?;
    let payload = machine
        .mailboxes
        .mailbox_mut(machine.piece.id().as_str())
        .and_then(|mailbox| mailbox.receive_message(&sender))
        .unwrap_or_default();
    machine.push(payload)?;
    Ok(Flow::Continue)
}

fn has_message(machine: &mut Machine<'_>) -> WordResult {
    let sender = machine.pop_text()?;
    let queued = machine
        .mailboxes
        .mailbox(machine.piece.id().as_str())
        .is_some_and(|mailbox| mailbox.has_message(&sender));
    machine.push_flag(queued)?;
    Ok(Flow::Continue)
}

fn clear_mail(machine: &mut Machine<'_>) -> WordResult {
    if let Some(mailbox) = machine.mailboxes.mailbox_mut(machine.piece.id().as_str()) {
        mailbox.clear();
    }
    Ok(Flow::Continue)
}

fn end(_machine: &mut Machine<'_>) -> WordResult {
    Ok(Flow::Halt)
}
