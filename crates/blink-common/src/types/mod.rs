mod state;
mod window;

pub use state::*;
pub use window::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_id_display() {
        assert_eq!(WindowId(1001).to_string(), "window-1001");
    }

    #[test]
    fn window_id_hash_and_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(WindowId(1));
        set.insert(WindowId(2));
        set.insert(WindowId(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn message_kind_names() {
        assert_eq!(MessageKind::CLOSE.name(), "close");
        assert_eq!(MessageKind::DESTROY.name(), "destroy");
        assert_eq!(MessageKind(0x0401).name(), "user");
        assert_eq!(MessageKind(0x0100).name(), "native");
        assert_eq!(MessageKind::CLOSE.to_string(), "close(0x0010)");
    }

    #[test]
    fn message_builder_sets_params() {
        let msg = Message::new(WindowId(3), MessageKind::USER).with_params(7, -1);
        assert_eq!(msg.window, WindowId(3));
        assert_eq!(msg.wparam, 7);
        assert_eq!(msg.lparam, -1);
    }

    #[test]
    fn disposition_maps_hook_boolean() {
        assert_eq!(Disposition::from_consumed(true), Disposition::Consumed);
        assert_eq!(Disposition::from_consumed(false), Disposition::Propagate);
        assert!(Disposition::Propagate.should_dispatch());
        assert!(!Disposition::Consumed.should_dispatch());
    }

    #[test]
    fn lifecycle_liveness() {
        assert!(LifecycleState::Created.is_alive());
        assert!(LifecycleState::Shown.is_alive());
        assert!(!LifecycleState::Destroyed.is_alive());
    }

    #[test]
    fn core_state_job_gate() {
        assert!(!CoreState::Idle.accepts_jobs());
        assert!(CoreState::Starting.accepts_jobs());
        assert!(CoreState::Running.accepts_jobs());
        assert!(!CoreState::ShuttingDown.accepts_jobs());
        assert!(!CoreState::Stopped.accepts_jobs());
    }

    #[test]
    fn core_state_serialization() {
        let states = [CoreState::Idle, CoreState::Running, CoreState::Stopped];
        for state in &states {
            let json = serde_json::to_string(state).unwrap();
            let deserialized: CoreState = serde_json::from_str(&json).unwrap();
            assert_eq!(*state, deserialized);
        }
    }
}
