//! List canonicalization
//!
//! Literal-only lists are sorted in place. When every element sits on its
//! own line, each element moves together with the source text up to the next
//! element (trailing comments included), so the printer lays the result out
//! as if it had been written in order. Elements sharing a line only trade
//! positions.

use bp2nix_core::{CommentGroup, Definition, Expression, File, List, Operator, Pos};
use tracing::trace;

/// Sort every eligible list in the file and restore comment order
pub fn sort_lists(file: &mut File) {
    let File { defs, comments, .. } = file;
    for def in defs.iter_mut() {
        match def {
            Definition::Assignment(assignment) => sort_in_value(&mut assignment.value, comments, false),
            Definition::Module(module) => {
                for property in &mut module.map.properties {
                    sort_in_value(&mut property.value, comments, false);
                }
            }
        }
    }
    comments.sort_by_key(|group| group.pos().offset);
}

/// Sort key of a literal element
fn sort_key(value: &Expression) -> Option<&str> {
    match value {
        Expression::String(s) => Some(&s.value),
        Expression::Int64(i) => Some(&i.token),
        Expression::Bool(b) => Some(&b.token),
        _ => None,
    }
}

/// Lists joined to a variable keep source order
fn sort_in_value(value: &mut Expression, comments: &mut [CommentGroup], in_variable_chain: bool) {
    match value {
        Expression::Operator(op) => {
            let keep_order = in_variable_chain || chain_has_variable(op);
            for arg in op.args.iter_mut() {
                sort_in_value(arg, comments, keep_order);
            }
        }
        Expression::Map(map) => {
            for property in &mut map.properties {
                sort_in_value(&mut property.value, comments, false);
            }
        }
        Expression::List(list) if !in_variable_chain => sort_list(list, comments),
        _ => {}
    }
}

fn chain_has_variable(op: &Operator) -> bool {
    op.args.iter().any(|arg| match arg {
        Expression::Variable(_) => true,
        Expression::Operator(inner) => chain_has_variable(inner),
        _ => false,
    })
}

fn sort_list(list: &mut List, comments: &mut [CommentGroup]) {
    let keys: Option<Vec<String>> = list
        .values
        .iter()
        .map(|v| sort_key(v).map(str::to_string))
        .collect();
    let Some(keys) = keys else {
        return;
    };
    if keys.windows(2).all(|w| w[0] <= w[1]) {
        return;
    }

    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    trace!("Sorting list at {}: {:?}", list.lbrace_pos, order);

    let lines: Vec<usize> = list
        .values
        .iter()
        .map(Expression::pos)
        .filter(|p| !p.is_none())
        .map(|p| p.line)
        .collect();
    if lines.windows(2).all(|w| w[0] < w[1]) {
        move_elements(list, comments, &order);
    } else {
        swap_positions(list, &order);
    }
}

/// The `k`-th sorted element takes the `k`-th original position. Comments
/// stay where they are.
fn swap_positions(list: &mut List, order: &[usize]) {
    let slots: Vec<Pos> = list.values.iter().map(Expression::pos).collect();
    let mut values: Vec<Option<Expression>> = std::mem::take(&mut list.values)
        .into_iter()
        .map(Some)
        .collect();
    for (slot, &index) in slots.into_iter().zip(order) {
        if let Some(mut value) = values[index].take() {
            value.set_pos(slot);
            list.values.push(value);
        }
    }
}

/// Lay elements out in sorted order, each carrying the lines it spanned.
/// The result never reaches past `rbrace_pos`.
fn move_elements(list: &mut List, comments: &mut [CommentGroup], order: &[usize]) {
    // An element owns the source text up to the next positioned element.
    // Synthesized elements own nothing.
    let spans: Vec<(Pos, Pos)> = (0..list.values.len())
        .map(|i| {
            let pos = list.values[i].pos();
            let next = list.values[i + 1..]
                .iter()
                .map(Expression::pos)
                .find(|p| !p.is_none())
                .unwrap_or(list.rbrace_pos);
            (pos, next)
        })
        .collect();

    let original: Vec<Pos> = comments.iter().map(CommentGroup::pos).collect();
    let mut slots: Vec<Option<Expression>> = std::mem::take(&mut list.values)
        .into_iter()
        .map(Some)
        .collect();
    let mut cur = spans.iter().map(|(pos, _)| *pos).find(|p| !p.is_none());

    for &index in order {
        let Some(mut value) = slots[index].take() else {
            continue;
        };
        let (pos, next) = spans[index];
        if let (Some(slot), false) = (cur.as_mut(), pos.is_none()) {
            value.set_pos(*slot);
            for (group, start) in comments.iter_mut().zip(&original) {
                if start.offset > pos.offset && start.offset < next.offset {
                    move_group(group, pos, *slot);
                }
            }
            slot.offset += next.offset.saturating_sub(pos.offset);
            slot.line += next.line.saturating_sub(pos.line).max(1);
        }
        list.values.push(value);
    }
}

/// Shift a comment group that trailed an element at `from` so that it
/// trails the same element at `to`
fn move_group(group: &mut CommentGroup, from: Pos, to: Pos) {
    for comment in &mut group.comments {
        comment.slash = comment.slash.relocate(from, to);
    }
}
