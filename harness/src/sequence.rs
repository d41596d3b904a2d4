//! Method sequences such as `mint(1000) burn(2000)`.

use std::fmt;
use std::str::FromStr;

use crate::client::VaultClient;
use crate::error::{HarnessError, HarnessResult};
use crate::setup::UserAccounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodCall {
    /// Lamports paid in
    Mint(u64),
    /// microK returned
    Burn(u64),
}

impl FromStr for MethodCall {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HarnessError::InvalidMethod(s.to_string());

        let (name, rest) = s.trim().split_once('(').ok_or_else(invalid)?;
        let amount = rest
            .strip_suffix(')')
            .ok_or_else(invalid)?
            .trim()
            .parse::<u64>()
            .map_err(|_| invalid())?;

        match name.trim() {
            "mint" => Ok(MethodCall::Mint(amount)),
            "burn" => Ok(MethodCall::Burn(amount)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for MethodCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodCall::Mint(amount) => write!(f, "mint({amount})"),
            MethodCall::Burn(amount) => write!(f, "burn({amount})"),
        }
    }
}

/// Parses a whitespace-separated list of calls
pub fn parse_sequence(methods: &str) -> HarnessResult<Vec<MethodCall>> {
    methods.split_whitespace().map(str::parse).collect()
}

/// Runs `calls` in order for `user`. Every call must produce a non-zero output.
pub async fn run_sequence(
    client: &mut VaultClient,
    user: &UserAccounts,
    calls: &[MethodCall],
) -> HarnessResult<Vec<(MethodCall, u64)>> {
    tracing::info!(?calls, "running method sequence");

    let mut outputs = Vec::with_capacity(calls.len());
    for call in calls {
        let output = match *call {
            MethodCall::Mint(amount) => client.call_mint(user, amount).await?,
            MethodCall::Burn(amount) => client.call_burn(user, amount).await?,
        };
        tracing::info!("{call} => {output}");

        if output == 0 {
            return Err(HarnessError::ZeroOutput(call.to_string()));
        }
        outputs.push((*call, output));
    }

    Ok(outputs)
}
