use crate::directive::{Directive, DirectiveParseError};
use crate::oracle::OracleError;
use exterm_memory::WorldModel;
use serde::{Deserialize, Deserializer, Serialize};

/// Parsed output of one oracle call: rationale, world-model delta and the
/// ordered directives to dispatch. Repair patches share the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DecisionWire", into = "DecisionWire")]
pub struct Decision {
    pub rationale: String,
    pub world_model_delta: WorldModel,
    pub directives: Vec<Directive>,
}

/// JSON object the oracle emits and the cache stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DecisionWire {
    #[serde(default, deserialize_with = "null_as_default")]
    thoughts: String,
    #[serde(default, deserialize_with = "null_as_default")]
    world_model: WorldModel,
    commands: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TryFrom<DecisionWire> for Decision {
    type Error = DirectiveParseError;

    fn try_from(wire: DecisionWire) -> Result<Self, Self::Error> {
        let directives = wire
            .commands
            .into_iter()
            .map(Directive::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Decision {
            rationale: wire.thoughts,
            world_model_delta: wire.world_model,
            directives,
        })
    }
}

impl From<Decision> for DecisionWire {
    fn from(decision: Decision) -> Self {
        DecisionWire {
            thoughts: decision.rationale,
            world_model: decision.world_model_delta,
            commands: decision.directives.into_iter().map(String::from).collect(),
        }
    }
}

impl Decision {
    pub fn new(directives: Vec<Directive>) -> Self {
        Self {
            rationale: String::new(),
            world_model_delta: WorldModel::new(),
            directives,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_world_model_delta(mut self, delta: WorldModel) -> Self {
        self.world_model_delta = delta;
        self
    }

    /// Parse raw oracle output. A malformed object is a schema error; a
    /// well-formed object carrying an unknown tag is an unclassified
    /// directive. Either one fails the whole decision.
    pub fn from_json(text: &str) -> Result<Self, OracleError> {
        let wire: DecisionWire =
            serde_json::from_str(text).map_err(|e| OracleError::Schema(e.to_string()))?;
        Ok(Decision::try_from(wire)?)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&DecisionWire::from(self.clone()))
            .unwrap_or_else(|_| r#"{"commands":[]}"#.to_string())
    }

    pub fn has_subprocess_directives(&self) -> bool {
        self.directives.iter().any(Directive::requires_subprocess)
    }
}
