//! Local mock agent with canned replies, for UI prototyping.
//!
//! Replies are drawn from a fixed template table chosen by the length of the
//! user's input. A simulated delay and an occasional simulated tool call make
//! the UI behave as it would against a real agent.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use super::{AgentError, AgentEvent, AgentEvents, ResponseSource, SourceStatus};
use crate::config::MockConfig;

/// Inputs up to this many characters use the short bucket.
pub const SHORT_MAX_CHARS: usize = 20;
/// Inputs up to this many characters (and above `SHORT_MAX_CHARS`) use the medium bucket.
pub const MEDIUM_MAX_CHARS: usize = 50;

/// Coarse input-length class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Short,
    Medium,
    Long,
}

impl Bucket {
    /// Classify by character count of the trimmed input.
    pub fn for_input(text: &str) -> Self {
        let len = text.trim().chars().count();
        if len <= SHORT_MAX_CHARS {
            Bucket::Short
        } else if len <= MEDIUM_MAX_CHARS {
            Bucket::Medium
        } else {
            Bucket::Long
        }
    }

    pub fn templates(&self) -> &'static [&'static str] {
        match self {
            Bucket::Short => SHORT_TEMPLATES,
            Bucket::Medium => MEDIUM_TEMPLATES,
            Bucket::Long => LONG_TEMPLATES,
        }
    }
}

const SHORT_TEMPLATES: &[&str] = &[
    "Hi there! You said **{input}**. What would you like to explore today?",
    "Got it: *{input}*. Could you tell me a little more about what you need?",
    "That's an interesting one! Let me think about **{input}**...",
    "Short and sweet. My quick take on *{input}*: it depends on the context.",
    "I can help you with that. Ask me anything about **{input}**.",
];

const MEDIUM_TEMPLATES: &[&str] = &[
    "I understand what you're asking. Here's my take on it:

- **Topic**: {input}
- **Approach**: start small and iterate
- **Next step**: share a concrete example",
    "Great point! From my perspective, I would say:

1. Clarify the goal behind *{input}*
2. Pick the simplest thing that could work
3. Measure before optimizing",
    "That's a complex topic. Let me break it down for you:

> {input}

The key is to find the right balance for your specific use case.",
    "Excellent question! The answer depends on several factors:

- **Scope**: how big is the problem?
- **Constraints**: time, budget and people
- **Risk**: what happens if it fails?",
];

const LONG_TEMPLATES: &[&str] = &[
    "Here are some **key points** to consider:

1. **First principle**: Always start with the basics
2. **Second principle**: Build incrementally
3. **Third principle**: Test early and often

> \"The best code is code that doesn't exist\" - Unknown

Would you like me to elaborate on any of these points?",
    "This is a multi-step process:

## Step 1: Planning
- Define your requirements
- Sketch out the architecture
- Consider edge cases

## Step 2: Implementation
```python
def example_function():
    return \"Hello, World!\"
```

## Step 3: Testing
Make sure to test thoroughly!",
    "Let me share some insights:

- **Pros**: This approach has several advantages
- **Cons**: However, there are some drawbacks to consider
- **Alternatives**: You might also consider these options

The key is to find the right balance for your specific use case.",
    "Here's what I recommend:

1. Start with a **simple prototype**
2. Gather **user feedback** early
3. Iterate based on **real data**

*Remember*: Perfect is the enemy of good!",
    "That's a great question! Here's my analysis:

### Technical Considerations
- Performance implications
- Scalability concerns
- Maintenance overhead

### Business Considerations
- Cost-benefit analysis
- Time to market
- Resource allocation

What aspect would you like to explore further?",
];

/// Simulated tool invocations: (tool name, progress text).
pub const TOOL_CALLS: &[(&str, &str)] = &[
    ("search_knowledge", "Searching knowledge base for relevant information..."),
    ("analyze_data", "Analyzing data patterns and trends..."),
    ("generate_code", "Generating code examples..."),
    ("format_response", "Formatting response with markdown..."),
    ("validate_logic", "Validating logical consistency..."),
];

/// Substitute the user's text into a template.
pub fn fill_template(template: &str, input: &str) -> String {
    template.replace("{input}", input.trim())
}

pub struct MockSource {
    name: String,
    rng: StdRng,
    min_delay: Duration,
    max_delay: Duration,
    tool_call_probability: f64,
    turns: usize,
}

impl MockSource {
    pub fn new(name: &str, config: &MockConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            name: name.to_string(),
            rng,
            min_delay: config.min_delay,
            max_delay: config.max_delay.max(config.min_delay),
            tool_call_probability: config.tool_call_probability.clamp(0.0, 1.0),
            turns: 0,
        }
    }

    fn pick_delay(&mut self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(self.rng.gen_range(min..=max))
    }

    /// Build the events of one turn without sleeping.
    fn compose(&mut self, text: &str) -> Vec<AgentEvent> {
        let mut events = Vec::with_capacity(2);

        if self.rng.gen_bool(self.tool_call_probability) {
            if let Some((tool, detail)) = TOOL_CALLS.choose(&mut self.rng) {
                events.push(AgentEvent::ToolCall {
                    tool: tool.to_string(),
                    detail: detail.to_string(),
                });
            }
        }

        let bucket = Bucket::for_input(text);
        let template = bucket
            .templates()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or("{input}");
        events.push(AgentEvent::AssistantText {
            text: fill_template(template, text),
        });

        events
    }
}

#[async_trait]
impl ResponseSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, text: &str) -> Result<AgentEvents, AgentError> {
        let delay = self.pick_delay();
        tracing::debug!(delay_ms = delay.as_millis() as u64, "mock agent thinking");
        tokio::time::sleep(delay).await;

        let events = self.compose(text);
        self.turns += 1;
        Ok(AgentEvents::new(events))
    }

    async fn reset(&mut self) -> Result<(), AgentError> {
        self.turns = 0;
        Ok(())
    }

    fn status(&self) -> SourceStatus {
        SourceStatus {
            name: self.name.clone(),
            kind: "mock",
            initialized: true,
            details: vec![
                ("Turns".to_string(), self.turns.to_string()),
                (
                    "Delay".to_string(),
                    format!(
                        "{}-{} ms",
                        self.min_delay.as_millis(),
                        self.max_delay.as_millis()
                    ),
                ),
                (
                    "Tool call probability".to_string(),
                    format!("{:.0}%", self.tool_call_probability * 100.0),
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn config(seed: u64, tool_call_probability: f64) -> MockConfig {
        MockConfig {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            tool_call_probability,
            seed: Some(seed),
        }
    }

    fn assistant_text(events: AgentEvents) -> String {
        events
            .filter_map(|e| match e {
                AgentEvent::AssistantText { text } => Some(text),
                AgentEvent::ToolCall { .. } => None,
            })
            .next()
            .expect("every turn has assistant text")
    }

    #[test]
    fn buckets_by_trimmed_length() {
        assert_eq!(Bucket::for_input("hi"), Bucket::Short);
        assert_eq!(Bucket::for_input(&"a".repeat(20)), Bucket::Short);
        assert_eq!(Bucket::for_input(&"a".repeat(21)), Bucket::Medium);
        assert_eq!(Bucket::for_input(&"a".repeat(50)), Bucket::Medium);
        assert_eq!(Bucket::for_input(&"a".repeat(51)), Bucket::Long);
        assert_eq!(Bucket::for_input(&format!("   {}   ", "a".repeat(20))), Bucket::Short);
    }

    #[test]
    fn bucket_tables_are_disjoint() {
        for short in SHORT_TEMPLATES {
            assert!(!MEDIUM_TEMPLATES.contains(short));
            assert!(!LONG_TEMPLATES.contains(short));
        }
        for medium in MEDIUM_TEMPLATES {
            assert!(!LONG_TEMPLATES.contains(medium));
        }
    }

    #[tokio::test]
    async fn replies_stay_within_their_bucket() {
        let inputs = [
            ("hi", Bucket::Short),
            ("how should I structure this service?", Bucket::Medium),
            (
                "please walk me through designing a resilient ingestion pipeline for logs",
                Bucket::Long,
            ),
        ];

        for (input, bucket) in inputs {
            let allowed: Vec<String> = bucket
                .templates()
                .iter()
                .map(|t| fill_template(t, input))
                .collect();
            let mut source = MockSource::new("MockBot", &config(42, 0.0));
            for _ in 0..25 {
                let reply = assistant_text(source.send(input).await.unwrap());
                assert!(allowed.contains(&reply), "reply for {:?} left its bucket: {}", input, reply);
            }
        }
    }

    #[tokio::test]
    async fn short_reply_interpolates_input() {
        let mut source = MockSource::new("MockBot", &config(1, 0.0));
        let reply = assistant_text(source.send("hi").await.unwrap());
        assert!(reply.contains("hi"));
    }

    #[tokio::test]
    async fn tool_calls_precede_assistant_text() {
        let mut source = MockSource::new("MockBot", &config(3, 1.0));
        let events: Vec<AgentEvent> = source.send("hi").await.unwrap().collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            AgentEvent::ToolCall { tool, .. } => {
                assert!(TOOL_CALLS.iter().any(|(name, _)| name == tool));
            }
            other => panic!("expected tool call first, got {:?}", other),
        }
        assert!(matches!(events[1], AgentEvent::AssistantText { .. }));
    }

    #[tokio::test]
    async fn zero_probability_never_calls_tools() {
        let mut source = MockSource::new("MockBot", &config(9, 0.0));
        for _ in 0..20 {
            let events = source.send("hello").await.unwrap();
            assert_eq!(events.len(), 1);
        }
    }

    #[tokio::test]
    async fn same_seed_same_replies() {
        let mut a = MockSource::new("A", &config(11, 0.5));
        let mut b = MockSource::new("B", &config(11, 0.5));
        for _ in 0..5 {
            let ea: Vec<AgentEvent> = a.send("tell me more").await.unwrap().collect();
            let eb: Vec<AgentEvent> = b.send("tell me more").await.unwrap().collect();
            assert_eq!(ea, eb);
        }
    }

    #[tokio::test]
    async fn delay_stays_within_bound() {
        let mut source = MockSource::new(
            "MockBot",
            &MockConfig {
                min_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(40),
                tool_call_probability: 0.0,
                seed: Some(5),
            },
        );
        let started = Instant::now();
        source.send("hi").await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(10));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn status_counts_turns_and_reset_clears() {
        let mut source = MockSource::new("MockBot", &config(2, 0.0));
        source.send("a").await.unwrap();
        source.send("b").await.unwrap();
        let status = source.status();
        assert_eq!(status.kind, "mock");
        assert!(status.details.contains(&("Turns".to_string(), "2".to_string())));

        source.reset().await.unwrap();
        assert!(source.status().details.contains(&("Turns".to_string(), "0".to_string())));
    }
}
