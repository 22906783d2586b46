//! Session change notifications.
//!
//! The authentication subsystem owns the session; the coordinator only holds
//! a `watch::Receiver`. [`SessionPublisher`] is the sending side for hosts
//! and tests that drive the session themselves.

use sync_types::{Role, Session, User};
use tokio::sync::watch;

/// Create a publisher and a receiver starting from a signed-out session.
pub fn session_channel() -> (SessionPublisher, watch::Receiver<Session>) {
    let publisher = SessionPublisher::new(Session::anonymous());
    let receiver = publisher.subscribe();
    (publisher, receiver)
}

/// Owner of the current session value.
#[derive(Debug)]
pub struct SessionPublisher {
    tx: watch::Sender<Session>,
}

impl SessionPublisher {
    /// Create a publisher holding `initial`.
    pub fn new(initial: Session) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// A new receiver observing this publisher.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Current session value.
    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Replace the session.
    pub fn publish(&self, session: Session) {
        self.tx.send_replace(session);
    }

    /// Sign `user` in.
    pub fn login(&self, user: User) {
        self.publish(Session::authenticated(user));
    }

    /// Sign out.
    pub fn logout(&self) {
        self.publish(Session::anonymous());
    }

    /// Change the signed-in user's role. No-op without a user.
    pub fn set_role(&self, role: Role) {
        self.tx.send_if_modified(|session| match session.user.as_mut() {
            Some(user) if user.role != role => {
                user.role = role;
                true
            }
            _ => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_signed_out() {
        let (publisher, rx) = session_channel();
        assert_eq!(*rx.borrow(), Session::anonymous());
        assert!(!publisher.current().is_authenticated);
    }

    #[test]
    fn login_and_logout_are_observed() {
        let (publisher, mut rx) = session_channel();

        publisher.login(User::new("u1", Role::Student));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().effective_role(), Role::Student);

        publisher.logout();
        assert_eq!(rx.borrow_and_update().effective_role(), Role::None);
    }

    #[test]
    fn set_role_changes_signed_in_user() {
        let (publisher, mut rx) = session_channel();
        publisher.login(User::new("u1", Role::Student));
        rx.borrow_and_update();

        publisher.set_role(Role::Faculty);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().effective_role(), Role::Faculty);
    }

    #[test]
    fn set_role_without_user_does_not_notify() {
        let (publisher, rx) = session_channel();
        publisher.set_role(Role::Admin);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn publish_works_without_receivers() {
        let publisher = SessionPublisher::new(Session::anonymous());
        publisher.login(User::new("u2", Role::Admin));
        assert_eq!(publisher.current().effective_role(), Role::Admin);
    }
}
