//! Detect command - print the contributed build plan

use crate::detect::detect;
use crate::error::VsdbgResult;

/// Execute the detect command
pub async fn execute() -> VsdbgResult<()> {
    print!("{}", detect().to_toml()?);
    Ok(())
}
