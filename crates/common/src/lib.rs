//! Shared building blocks for the PVZ service crates: logging setup and
//! small response types used by more than one crate.

pub mod types;

pub mod utils {
    pub mod logging;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn health_serializes_status() {
        let h = types::Health { status: "ok" };
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);
    }
}
