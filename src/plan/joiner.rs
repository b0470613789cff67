/// Join semantics for co-group stages
use crate::error::{AssemblyError, AssemblyResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How unmatched rows of each joined side are treated
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Joiner {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
    /// Per-side flag: `true` = required (inner), `false` = optional (outer)
    Mixed(Vec<bool>),
}

impl Joiner {
    /// Parse mixed-joiner entries: `true`/`1`/`inner` or `false`/`0`/`outer`
    pub fn mixed<I, S>(entries: I) -> AssemblyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sides = entries
            .into_iter()
            .map(|entry| match entry.as_ref().trim() {
                "true" | "1" | "inner" => Ok(true),
                "false" | "0" | "outer" => Ok(false),
                other => Err(AssemblyError::invalid_joiner_value(
                    "invalid mixed joiner entry",
                    other,
                )),
            })
            .collect::<AssemblyResult<Vec<bool>>>()?;
        Ok(Joiner::Mixed(sides))
    }

    /// Required flag for each of `arity` joined sides.
    ///
    /// Left/right/outer follow two-sided semantics generalized to n sides: left
    /// requires only the first side, right only the last.
    pub fn required_sides(&self, arity: usize) -> AssemblyResult<Vec<bool>> {
        let sides = match self {
            Joiner::Inner => vec![true; arity],
            Joiner::Outer => vec![false; arity],
            Joiner::Left => (0..arity).map(|i| i == 0).collect(),
            Joiner::Right => (0..arity).map(|i| i + 1 == arity).collect(),
            Joiner::Mixed(sides) => {
                if sides.len() != arity {
                    return Err(AssemblyError::invalid_joiner_value(
                        format!("mixed joiner has {} entries for {} joined branches", sides.len(), arity),
                        format!("{:?}", sides),
                    ));
                }
                sides.clone()
            }
        };
        Ok(sides)
    }
}

impl FromStr for Joiner {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "inner" => Ok(Joiner::Inner),
            "left" => Ok(Joiner::Left),
            "right" => Ok(Joiner::Right),
            "outer" => Ok(Joiner::Outer),
            other => Err(AssemblyError::invalid_joiner_value("unknown joiner kind", other)),
        }
    }
}
