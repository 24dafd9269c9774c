/// Lifecycle settings loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct LifecycleConfig {
    /// Inbox that receives new-request notices. No notice is sent when unset.
    pub staff_inbox: Option<String>,
    /// Whether startup reconciliation deletes leftover promoted requests.
    pub reconcile_repair: bool,
}

impl LifecycleConfig {
    /// | Env Var              | Default |
    /// |----------------------|---------|
    /// | `STAFF_NOTIFY_EMAIL` | unset   |
    /// | `RECONCILE_REPAIR`   | `true`  |
    pub fn from_env() -> Self {
        let staff_inbox = std::env::var("STAFF_NOTIFY_EMAIL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let reconcile_repair = std::env::var("RECONCILE_REPAIR")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        Self {
            staff_inbox,
            reconcile_repair,
        }
    }
}
