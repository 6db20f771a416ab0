/// Return this error from an agent's behaviour function to indicate that the agent is bailing.
///
/// This should be used when an agent hits an error that will repeat on every iteration, such as a
/// request URL that cannot be built. The agent stops but the scenario continues with the other
/// agents.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct AgentBailError {
    msg: String,
}

impl AgentBailError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl Default for AgentBailError {
    fn default() -> Self {
        Self::new("Agent is bailing")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_message() {
        assert_eq!("Agent is bailing", AgentBailError::default().to_string());
        assert_eq!(
            "bad url",
            AgentBailError::new("bad url").to_string()
        );
    }
}
