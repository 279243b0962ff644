use axum_extra::extract::cookie::{Cookie, CookieJar};
use dashmap::DashMap;
use uuid::Uuid;

use crate::store::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Danger,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Default)]
struct Session {
    user: Option<SessionUser>,
    flash: Vec<Flash>,
}

/// Server-side sessions keyed by a random id carried in a cookie. Anonymous
/// visitors get a session too, so flash messages survive the
/// post/redirect/get dance before login.
pub struct SessionStore {
    cookie_name: String,
    sessions: DashMap<Uuid, Session>,
}

impl SessionStore {
    pub fn new(cookie_name: String) -> Self {
        Self {
            cookie_name,
            sessions: DashMap::new(),
        }
    }

    /// Returns the live session for this jar, creating one (and its cookie)
    /// when the jar has none or references a session that no longer exists.
    pub fn ensure(&self, jar: CookieJar) -> (CookieJar, Uuid) {
        if let Some(id) = self.session_id(&jar) {
            if self.sessions.contains_key(&id) {
                return (jar, id);
            }
        }

        let id = Uuid::new_v4();
        self.sessions.insert(id, Session::default());

        let mut cookie = Cookie::new(self.cookie_name.clone(), id.to_string());
        cookie.set_path("/");
        cookie.set_http_only(true);
        (jar.add(cookie), id)
    }

    fn session_id(&self, jar: &CookieJar) -> Option<Uuid> {
        jar.get(&self.cookie_name)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    }

    pub fn current_user(&self, jar: &CookieJar) -> Option<SessionUser> {
        let id = self.session_id(jar)?;
        self.sessions.get(&id)?.user.clone()
    }

    pub fn login(&self, id: Uuid, user: SessionUser) {
        if let Some(mut session) = self.sessions.get_mut(&id) {
            session.user = Some(user);
        }
    }

    /// Drops the whole session, flash queue included.
    pub fn logout(&self, jar: &CookieJar) {
        if let Some(id) = self.session_id(jar) {
            self.sessions.remove(&id);
        }
    }

    pub fn push_flash(&self, id: Uuid, level: FlashLevel, message: impl Into<String>) {
        if let Some(mut session) = self.sessions.get_mut(&id) {
            session.flash.push(Flash {
                level,
                message: message.into(),
            });
        }
    }

    /// Drains queued flash messages; each message renders exactly once.
    pub fn take_flash(&self, id: Uuid) -> Vec<Flash> {
        self.sessions
            .get_mut(&id)
            .map(|mut session| std::mem::take(&mut session.flash))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new("medtrack_session".to_string())
    }

    #[test]
    fn ensure_creates_session_and_cookie() {
        let store = store();
        let (jar, id) = store.ensure(CookieJar::new());

        let cookie = jar.get("medtrack_session").expect("cookie set");
        assert_eq!(cookie.value(), id.to_string());

        // Same jar reuses the same session.
        let (_, again) = store.ensure(jar);
        assert_eq!(id, again);
    }

    #[test]
    fn login_attaches_user_until_logout() {
        let store = store();
        let (jar, id) = store.ensure(CookieJar::new());

        assert!(store.current_user(&jar).is_none());

        store.login(
            id,
            SessionUser {
                user_id: Uuid::new_v4(),
                email: "jane@example.com".to_string(),
                role: Role::Patient,
            },
        );
        assert_eq!(
            store.current_user(&jar).unwrap().email,
            "jane@example.com"
        );

        store.logout(&jar);
        assert!(store.current_user(&jar).is_none());
    }

    #[test]
    fn flash_drains_once() {
        let store = store();
        let (_, id) = store.ensure(CookieJar::new());

        store.push_flash(id, FlashLevel::Success, "Login successful!");
        store.push_flash(id, FlashLevel::Danger, "Something else");

        let drained = store.take_flash(id);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "Login successful!");
        assert!(store.take_flash(id).is_empty());
    }

    #[test]
    fn stale_cookie_gets_fresh_session() {
        let store = store();
        let (jar, id) = store.ensure(CookieJar::new());
        store.logout(&jar);

        let (_, fresh) = store.ensure(jar);
        assert_ne!(id, fresh);
    }
}
