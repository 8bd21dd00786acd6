//! Deterministic fallback replies.
//!
//! Matches a handful of keyword groups and otherwise cycles through general
//! supportive openers. Useful for local development and as an explicit
//! fallback mode when no generative backend should be called.

use async_trait::async_trait;

use super::{Reply, Responder, ResponderError};

const MODEL_NAME: &str = "canned";

const ABUSE: &str = "I believe you. What happened is not your fault, and you deserve safety and \
support. Kenya GBV Hotline: 1195 (toll-free, 24/7). You don't have to carry this alone.";

const FEAR: &str = "Your fear is valid and your safety comes first. If you are in immediate \
danger, please call 999 or 1195. I'm here with you. What would help you feel safer right now?";

const SELF_HARM: &str = "Your life matters, and I'm really glad you told me. Please reach out now: \
Kenya Mental Health 0800 720 990, Befrienders Kenya +254 722 178 177. Are you safe at this moment?";

const ANXIETY: &str = "Anxiety after hard experiences is your body trying to protect you. \
Grounding can help: name 5 things you see, 4 you hear, 3 you can touch. \
Kenya Mental Health: 0800 720 990.";

const LOW_MOOD: &str = "I hear you, and your feelings make sense. You're not alone. \
Befrienders Kenya: +254 722 178 177. Small steps count.";

const OPENERS: [&str; 4] = [
    "You've taken a brave step by reaching out. I'm here to listen without judgment. What's on your mind?",
    "I'm here for you. How can I support you today?",
    "Thank you for trusting me with this. Your feelings are valid. What would help you feel more supported right now?",
    "I'm listening. You don't have to go through this alone. Take your time.",
];

/// Keyword-matched responder that never touches the network.
#[derive(Debug, Clone, Default)]
pub struct CannedResponder;

impl CannedResponder {
    /// Pick the reply for `message`.
    #[must_use]
    pub fn reply_for(message: &str) -> &'static str {
        let lower = message.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if mentions(&["suicide", "kill myself", "end my life", "self-harm", "hurt myself"]) {
            SELF_HARM
        } else if mentions(&["abuse", "violence", "hit me", "hurt"]) {
            ABUSE
        } else if mentions(&["scared", "afraid", "fear"]) {
            FEAR
        } else if mentions(&["anxious", "anxiety", "stress", "panic"]) {
            ANXIETY
        } else if mentions(&["depressed", "depression", "sad", "hopeless"]) {
            LOW_MOOD
        } else {
            OPENERS[message.len() % OPENERS.len()]
        }
    }
}

#[async_trait]
impl Responder for CannedResponder {
    async fn generate(
        &self,
        _persona: &str,
        _history: &[String],
        message: &str,
    ) -> Result<Reply, ResponderError> {
        Ok(Reply {
            text: Self::reply_for(message).to_string(),
            model: MODEL_NAME.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_harm_wins_over_hurt() {
        assert_eq!(CannedResponder::reply_for("I want to hurt myself"), SELF_HARM);
    }

    #[test]
    fn keyword_groups_match() {
        assert_eq!(CannedResponder::reply_for("He keeps hitting me, it's abuse"), ABUSE);
        assert_eq!(CannedResponder::reply_for("I'm so SCARED tonight"), FEAR);
        assert_eq!(CannedResponder::reply_for("work stress is crushing"), ANXIETY);
        assert_eq!(CannedResponder::reply_for("feeling hopeless"), LOW_MOOD);
    }

    #[test]
    fn default_is_deterministic() {
        let first = CannedResponder::reply_for("hello there");
        let second = CannedResponder::reply_for("hello there");
        assert_eq!(first, second);
        assert!(OPENERS.contains(&first));
    }

    #[tokio::test]
    async fn generate_tags_model() {
        let reply = CannedResponder.generate("", &[], "hi").await.unwrap();
        assert_eq!(reply.model, "canned");
        assert!(!reply.text.is_empty());
    }
}
