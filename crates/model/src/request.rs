/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelRequest {
    /// The input messages.
    pub messages: Vec<ModelMessage>,
    /// The sampling temperature. `None` leaves it to the provider.
    pub temperature: Option<f64>,
}

impl ModelRequest {
    /// Returns the concatenated text of all messages, in order.
    ///
    /// This is the prompt exactly as the model will see it, minus any
    /// provider-specific framing.
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .map(ModelMessage::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
}

impl ModelMessage {
    /// Returns the text of this message.
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            ModelMessage::System(text) | ModelMessage::User(text) => text,
        }
    }
}
