//! Static text banks compiled into the binary.

/// Languages whose banks ship with the crate.
pub const EMBEDDED_LANGUAGES: &[&str] = &["en", "bn"];

/// Themed excuse categories.
pub const EXCUSE_CATEGORIES: &[&str] = &["quantum", "cosmic", "ai", "technical", "blame"];

/// Supporting banks that are not excuse categories.
pub const AUXILIARY_BANKS: &[&str] = &["recommendations", "connectors", "intensifiers", "frames"];

/// Categories whose phrases also train the jargon chain.
pub const JARGON_CATEGORIES: &[&str] = &["quantum", "technical", "ai"];

/// Raw JSON of an embedded bank.
pub fn embedded_bank(language: &str, bank: &str) -> Option<&'static str> {
    let raw = match (language, bank) {
        ("en", "quantum") => include_str!("../../data/en/quantum.json"),
        ("en", "cosmic") => include_str!("../../data/en/cosmic.json"),
        ("en", "ai") => include_str!("../../data/en/ai.json"),
        ("en", "technical") => include_str!("../../data/en/technical.json"),
        ("en", "blame") => include_str!("../../data/en/blame.json"),
        ("en", "recommendations") => include_str!("../../data/en/recommendations.json"),
        ("en", "connectors") => include_str!("../../data/en/connectors.json"),
        ("en", "intensifiers") => include_str!("../../data/en/intensifiers.json"),
        ("en", "frames") => include_str!("../../data/en/frames.json"),
        ("bn", "quantum") => include_str!("../../data/bn/quantum.json"),
        ("bn", "cosmic") => include_str!("../../data/bn/cosmic.json"),
        ("bn", "ai") => include_str!("../../data/bn/ai.json"),
        ("bn", "technical") => include_str!("../../data/bn/technical.json"),
        ("bn", "blame") => include_str!("../../data/bn/blame.json"),
        ("bn", "recommendations") => include_str!("../../data/bn/recommendations.json"),
        ("bn", "connectors") => include_str!("../../data/bn/connectors.json"),
        ("bn", "intensifiers") => include_str!("../../data/bn/intensifiers.json"),
        ("bn", "frames") => include_str!("../../data/bn/frames.json"),
        _ => return None,
    };

    Some(raw)
}

// Fallbacks for missing auxiliary banks.

pub const FALLBACK_CONNECTORS: &[&str] = &["which caused", "resulting in"];
pub const FALLBACK_RECOMMENDATIONS: &[&str] = &["Try again later"];
pub const FALLBACK_MILD_INTENSIFIERS: &[&str] = &["slightly"];
pub const FALLBACK_MEDIUM_INTENSIFIERS: &[&str] = &["definitely"];
pub const FALLBACK_SEVERE_INTENSIFIERS: &[&str] = &["catastrophically"];
pub const FALLBACK_PRIMARY_FRAME: &str = "The error was {intensifier} caused by {excuse}";
pub const FALLBACK_SECONDARY_FRAME: &str = "{connector} {excuse}";
pub const FALLBACK_JARGON_FRAME: &str = "Additionally, analysis shows {jargon} instability";
pub const FALLBACK_TERMINATOR: &str = ".";

/// Built-in corpus of technical jargon, one phrase per line.
pub const TECHNICAL_CORPUS: &str = r#"
distributed systems consensus algorithm byzantine fault tolerance
eventual consistency CAP theorem race condition deadlock mutex
garbage collection memory leak stack overflow heap corruption
cache miss branch prediction pipeline stall context switch
virtual memory page fault segmentation violation kernel panic
quantum supremacy neural architecture tensor flow gradient descent
backpropagation activation function loss landscape optimization
container orchestration service mesh circuit breaker load balancer
microservice architecture event sourcing CQRS saga pattern
blockchain immutable ledger smart contract proof of work
machine learning deep learning reinforcement learning transfer
natural language processing computer vision generative adversarial
edge computing fog computing serverless lambda function
kubernetes docker swarm container registry helm chart
continuous integration continuous deployment infrastructure code
test driven development behavior driven agile scrum kanban
object oriented functional programming reactive streams
asynchronous programming callback promise async await
RESTful API GraphQL gRPC websocket protocol buffer
SQL NoSQL ACID BASE CAP eventual consistency
indexing sharding partitioning replication clustering
encryption hashing salting JWT OAuth SAML SSO
firewall VPN proxy reverse proxy CDN WAF DDoS
monitoring logging tracing metrics alerting observability
"#;

/// Error messages sampled by batch generation when the caller gives none.
pub const SAMPLE_ERRORS: &[&str] = &[
    "FATAL ERROR: Everything is broken!",
    "SegmentationFault: Core dumped",
    "NullPointerException at line infinity",
    "KeyError: 'success'",
    "RuntimeError: Unknown error occurred",
    "ValueError: Invalid value",
    "TypeError: Type mismatch",
    "MemoryError: Out of memory",
];

/// Haiku lines used when an excuse is too short to fill a line.
pub const HAIKU_FIVE_SYLLABLE_LINES: &[&str] = &["Bits flip in the void", "Quantum states collapse", "The cache has failed us", "Cosmic rays strike hard", "Memory leaks out"];
pub const HAIKU_SEVEN_SYLLABLE_LINES: &[&str] = &["Digital tears fall like rain", "The servers are weeping now", "Distributed chaos reigns here", "Neural networks dream of bugs"];

/// Banner printed by the CLI.
pub const BANNER: &str = r#"
    ╔═══════════════════════════════════════╗
    ║      🚀 COSMIC EXCUSE GENERATOR 🚀    ║
    ║    When code fails, excuses prevail!  ║
    ╚═══════════════════════════════════════╝
"#;

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_embedded_bank_is_valid_json() {
        for language in EMBEDDED_LANGUAGES {
            for bank in EXCUSE_CATEGORIES.iter().chain(AUXILIARY_BANKS) {
                let raw = embedded_bank(language, bank).unwrap_or_else(|| panic!("missing {language}/{bank}"));
                let value: serde_json::Value = serde_json::from_str(raw).unwrap();

                assert_eq!(value["language"], *language);
                assert!(!value["excuses"].is_null());
            }
        }
    }

    #[test]
    fn test_unknown_bank_is_none() {
        assert!(embedded_bank("fr", "quantum").is_none());
        assert!(embedded_bank("en", "weather").is_none());
    }
}
