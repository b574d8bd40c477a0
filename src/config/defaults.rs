//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn input() -> PathBuf {
        "example.mdx".into()
    }

    pub fn output() -> PathBuf {
        "dist".into()
    }

    pub mod css {
        use std::path::PathBuf;

        pub fn input() -> PathBuf {
            "src/styles/main.css".into()
        }

        pub mod tailwind {
            pub fn command() -> Vec<String> {
                vec!["tailwindcss".into()]
            }
        }
    }
}

// ============================================================================
// [document] Section Defaults
// ============================================================================

pub mod document {
    pub fn lang() -> String {
        "en".into()
    }

    pub fn meta() -> Vec<String> {
        ["author", "date", "description"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        3000
    }

    pub fn poll_interval_ms() -> u64 {
        1000
    }

    pub fn debounce_ms() -> u64 {
        0
    }
}
