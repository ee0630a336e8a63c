//! Implementation of the IMPORT statement.

use super::{CommandContext, StatementResult};

/// `IMP <channel>, <variable>`
///
/// Evaluates the channel expression, asks the host bridge for the value on that
/// channel, and stores it in the variable. A missing separator or an unparseable
/// operand aborts the statement before the bridge is called.
pub fn import(cx: &mut CommandContext<'_>) -> StatementResult {
    let channel = cx.eval()?;
    cx.expect_separator()?;
    let index = cx.variable_slot()?;
    let value = cx.platform.import(channel);
    cx.interpreter.set_variable(index, value)
}
