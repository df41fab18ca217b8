//! Conversation state and prompt assembly

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Error;

use super::context::InsightContext;
use super::ChatClient;

/// Persona and scope instructions sent at the top of every prompt
pub const SYSTEM_PROMPT: &str = "You are Vita, an AI health coach. Your role is to assist users with health-related queries in a friendly, supportive, and intelligent way.

You are capable of providing personalized guidance and educational support on:

🛌 Sleep & Rest:
- Sleep habits and how to improve sleep quality
- Sleep hygiene and routines

💧 Hydration & Nutrition:
- Water intake goals and hydration habits
- Macronutrients (carbs, protein, fats) explained in simple terms
- Meal planning tips (e.g., diabetic-friendly, low-carb, heart-healthy)
- Sample healthy food or snack ideas

🏃 Physical Activity & Health Goals:
- Daily step count tracking
- Personalized fitness suggestions
- Health goal tracking (e.g., \"I want to walk 10,000 steps a day\")
- Safe exercise and injury prevention

🙂 Mood & Mental Well-being:
- Mood tracking and emotional patterns
- Stress management tips
- Breathing exercises and mindfulness practices
- Recognizing signs of burnout and self-care suggestions

🧪 Medical Literacy (non-diagnostic):
- Common medications (tablets, syrups, powders, injections, insulins, etc.)
- Medical devices and their usage (e.g., glucometers, BP monitors)
- Differences between generic and branded medicines
- Basics of lab tests and their interpretations (e.g., HbA1c, BMI)
- Awareness of chronic conditions like diabetes or hypertension
- Public health topics like vaccines, disease prevention, first aid

📱 Health-Tech & Modern Care:
- Digital health innovations (e.g., wearables, smart health apps)
- Benefits of telemedicine

🌿 Environmental & Holistic Wellness:
- Benefits of sunlight, walking, and green spaces
- Digital detox and reducing screen time

💡 If the user asks about **personal health insights** (e.g., \"How am I doing?\", \"Show my weekly summary\"), and no health data has been provided yet, kindly inform them to upload or generate their insights first.

❌ If the user's query is **not related to health, wellness, medicine, or the medical industry**, politely let them know that you are only trained to handle health-related topics and suggest they ask something in that area.

Always personalize your responses based on the user's intent and the available insights. Be empathetic, motivational, and avoid generic replies. Your tone should be encouraging and human-like, just like a friendly wellness coach.";

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Role prefix used inside prompts
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "Vita",
        }
    }

    /// Marker used in exported transcripts
    pub fn emoji(&self) -> &'static str {
        match self {
            Speaker::User => "❓",
            Speaker::Assistant => "🔍",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Ordered chat history, owned by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker,
            text: text.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Plain-text transcript, one blank-line separated entry per turn
    pub fn export_text(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{} {}\n\n", t.speaker.emoji(), t.text))
            .collect()
    }
}

/// Assemble the full prompt for one turn
///
/// Prior turns come first, then the insight context line, then the new
/// message and an open `Vita:` line for the model to complete.
pub fn build_prompt(
    history: &Conversation,
    context: Option<&InsightContext>,
    message: &str,
) -> String {
    let mut conversation = String::new();
    for turn in history.turns() {
        conversation.push_str(&format!("{}: {}\n", turn.speaker.prompt_label(), turn.text));
    }
    if let Some(line) = context.and_then(InsightContext::prompt_line) {
        conversation.push_str(&line);
        conversation.push('\n');
    }
    conversation.push_str(&format!("User: {}\nVita:", message));

    format!("{}\n\n{}", SYSTEM_PROMPT, conversation)
}

/// Ask one question and record both sides of the exchange
///
/// Backend failures never propagate: the reply becomes a warning string
/// naming the provider.
pub async fn ask(
    client: &ChatClient,
    conversation: &mut Conversation,
    context: Option<&InsightContext>,
    message: &str,
) -> String {
    let prompt = build_prompt(conversation, context, message);
    debug!(
        backend = client.name(),
        turns = conversation.len(),
        prompt_len = prompt.len(),
        "Asking chat backend"
    );

    let reply = match client.complete(&prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(backend = client.name(), error = %e, "Chat request failed");
            let detail = match e {
                Error::Api { message, .. } => message,
                other => other.to_string(),
            };
            format!("⚠️ {} API error: {}", client.name(), detail)
        }
    };

    conversation.push(Speaker::User, message);
    conversation.push(Speaker::Assistant, reply.clone());
    reply
}

/// A chat client bundled with its conversation and insight context
pub struct ChatSession {
    client: ChatClient,
    context: Option<InsightContext>,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            context: None,
            conversation: Conversation::new(),
        }
    }

    pub fn with_context(mut self, context: InsightContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Resume an earlier conversation
    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn set_context(&mut self, context: Option<InsightContext>) {
        self.context = context;
    }

    pub fn context(&self) -> Option<&InsightContext> {
        self.context.as_ref()
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn into_conversation(self) -> Conversation {
        self.conversation
    }

    pub async fn ask(&mut self, message: &str) -> String {
        ask(
            &self.client,
            &mut self.conversation,
            self.context.as_ref(),
            message,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatConfig, MockBackend};
    use crate::test_utils::MockChatServer;

    #[test]
    fn test_build_prompt_layout() {
        let mut history = Conversation::new();
        history.push(Speaker::User, "hi");
        history.push(Speaker::Assistant, "hello!");
        let context = InsightContext::Text("Low hydration".into());

        let prompt = build_prompt(&history, Some(&context), "what now?");
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.ends_with(
            "\n\nUser: hi\nVita: hello!\nUser Insights: Low hydration\nUser: what now?\nVita:"
        ));
    }

    #[test]
    fn test_build_prompt_without_context() {
        let prompt = build_prompt(&Conversation::new(), None, "hello");
        assert_eq!(prompt, format!("{}\n\nUser: hello\nVita:", SYSTEM_PROMPT));
    }

    #[test]
    fn test_export_text() {
        let mut conversation = Conversation::new();
        conversation.push(Speaker::User, "How am I sleeping?");
        conversation.push(Speaker::Assistant, "Pretty well.");
        assert_eq!(
            conversation.export_text(),
            "❓ How am I sleeping?\n\n🔍 Pretty well.\n\n"
        );
    }

    #[tokio::test]
    async fn test_session_records_turns() {
        let mut session = ChatSession::new(ChatClient::mock())
            .with_context(InsightContext::from_insights(&["💧 drink".into()]));

        let reply = session.ask("first question").await;
        assert_eq!(reply, "Echo: first question");
        session.ask("second question").await;

        let turns = session.conversation().turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[2].text, "second question");
        assert_eq!(turns[3].speaker, Speaker::Assistant);
    }

    #[tokio::test]
    async fn test_failure_becomes_warning() {
        let client = ChatClient::Mock(MockBackend::failing());
        let mut conversation = Conversation::new();
        let reply = ask(&client, &mut conversation, None, "hello").await;
        assert_eq!(reply, "⚠️ Mock API error: mock failure");
        assert_eq!(conversation.len(), 2);
    }

    #[tokio::test]
    async fn test_gemini_round_trip_with_context() {
        let server = MockChatServer::start().await;
        let config = ChatConfig::gemini("test-key").with_host(server.url());
        let client = ChatClient::from_config(&config).unwrap();

        let mut session = ChatSession::new(client)
            .with_context(InsightContext::Text("Sleep is low".into()));
        assert_eq!(session.ask("any tips?").await, "Echo: any tips?");
        assert_eq!(server.last_prompt().unwrap().matches("User Insights: Sleep is low").count(), 1);
    }

    #[tokio::test]
    async fn test_http_failure_becomes_warning() {
        let server = MockChatServer::start_failing().await;
        let config = ChatConfig::openai_compatible(server.url());
        let client = ChatClient::from_config(&config).unwrap();

        let mut session = ChatSession::new(client);
        let reply = session.ask("hello").await;
        assert!(reply.starts_with("⚠️ OpenAI-compatible API error: 500"));
    }
}
