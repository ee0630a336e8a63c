//! Implementation of the EXPORT statement.

use super::{CommandContext, StatementResult};

/// `EXP <channel>, <expression>`
///
/// Evaluates both operands and forwards the pair to the host bridge, once per
/// execution of the statement. Parse failures abort before anything is sent.
pub fn export(cx: &mut CommandContext<'_>) -> StatementResult {
    let channel = cx.eval()?;
    cx.expect_separator()?;
    let value = cx.eval()?;
    cx.platform.export(channel, value);
    Ok(())
}
