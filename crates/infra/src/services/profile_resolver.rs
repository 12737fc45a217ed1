use tracing::{debug, instrument, warn};

use gatehouse_auth::{Profile, ProfileUpsert, SessionUser};

use crate::store::{ProfileStore, StoreError};

/// Fetch-or-create of the signed-in user's profile.
///
/// Never fails: store problems degrade to an in-memory profile so routing
/// always gets an answer.
#[derive(Debug, Clone)]
pub struct ProfileResolver<P> {
    profiles: P,
}

impl<P: ProfileStore> ProfileResolver<P> {
    pub fn new(profiles: P) -> Self {
        Self { profiles }
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn resolve(&self, user: &SessionUser) -> Profile {
        match self.profiles.find(user.id).await {
            Ok(Some(row)) => return row.into_profile(),
            Ok(None) => {}
            Err(StoreError::MissingColumn(column)) => {
                warn!(user_id = %user.id, column = %column, "profile role unavailable; reading without it");
                match self.profiles.find_without_role(user.id).await {
                    // Defaulted role is not written back.
                    Ok(Some(row)) => return row.into_profile(),
                    Ok(None) => {}
                    Err(error) => {
                        warn!(user_id = %user.id, error = %error, operation = "find_without_role", "profile read failed");
                        return Profile::provisioned(user);
                    }
                }
            }
            Err(error) => {
                warn!(user_id = %user.id, error = %error, operation = "find", "profile read failed");
                return Profile::provisioned(user);
            }
        }

        self.provision(user).await
    }

    async fn provision(&self, user: &SessionUser) -> Profile {
        let profile = Profile::provisioned(user);
        match self.profiles.upsert(ProfileUpsert::provisioned(user)).await {
            Ok(()) => debug!(user_id = %user.id, role = %profile.role.as_str(), "profile created"),
            Err(error) => {
                warn!(user_id = %user.id, error = %error, operation = "upsert", "profile creation failed; using in-memory profile")
            }
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;

    use gatehouse_auth::UserMetadata;
    use gatehouse_core::UserId;

    use super::*;
    use crate::store::{InMemoryProfileStore, ProfileRow};

    fn user(role_hint: Option<&str>) -> SessionUser {
        SessionUser {
            id: UserId::new(),
            email: Some("eva@example.com".into()),
            created_at: Utc::now(),
            user_metadata: UserMetadata {
                role: role_hint.map(str::to_string),
                ..UserMetadata::default()
            },
        }
    }

    fn row_for(u: &SessionUser, role: Option<&str>) -> ProfileRow {
        ProfileRow {
            id: u.id,
            full_name: "Eva".into(),
            email: "eva@example.com".into(),
            phone: Some("555".into()),
            avatar_url: None,
            role: role.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn existing_profile_is_returned_verbatim() {
        let store = InMemoryProfileStore::arc();
        let u = user(Some("sindico"));
        store.insert_row(row_for(&u, Some("colaborador")));

        let profile = ProfileResolver::new(store.clone()).resolve(&u).await;
        assert!(profile.is_collaborator());
        assert_eq!(profile.phone.as_deref(), Some("555"));
    }

    #[tokio::test]
    async fn null_role_reads_as_sindico() {
        let store = InMemoryProfileStore::arc();
        let u = user(None);
        store.insert_row(row_for(&u, None));

        let profile = ProfileResolver::new(store.clone()).resolve(&u).await;
        assert_eq!(profile.role.as_str(), "sindico");
        assert_eq!(store.row(u.id).unwrap().role, None);
    }

    #[tokio::test]
    async fn missing_profile_is_created_once() {
        let store = InMemoryProfileStore::arc();
        let resolver = ProfileResolver::new(store.clone());
        let u = user(Some("colaborador"));

        let first = resolver.resolve(&u).await;
        let second = resolver.resolve(&u).await;

        assert_eq!(first.id, second.id);
        assert_eq!(first.role, second.role);
        assert_eq!(store.len(), 1);
        let stored = store.row(u.id).unwrap();
        assert_eq!(stored.role.as_deref(), Some("colaborador"));

        // Only the stored row takes the e-mail as a name.
        assert_eq!(first.full_name, "");
        assert_eq!(stored.full_name, "eva@example.com");
        assert_eq!(second.full_name, "eva@example.com");
    }

    #[tokio::test]
    async fn degraded_schema_defaults_role_without_writing() {
        let store = Arc::new(InMemoryProfileStore::without_role_column());
        let u = user(None);
        store.insert_row(row_for(&u, Some("colaborador")));

        let profile = ProfileResolver::new(store.clone()).resolve(&u).await;
        assert_eq!(profile.role.as_str(), "sindico");
        assert_eq!(profile.phone.as_deref(), Some("555"));
        assert_eq!(store.row(u.id).unwrap().role.as_deref(), Some("colaborador"));
    }

    #[tokio::test]
    async fn degraded_schema_without_row_returns_unsaved_profile() {
        let store = Arc::new(InMemoryProfileStore::without_role_column());
        let u = user(Some("colaborador"));

        let profile = ProfileResolver::new(store.clone()).resolve(&u).await;
        assert_eq!(profile.id, u.id);
        assert!(profile.is_collaborator());
        assert!(store.is_empty());
    }

    struct BrokenStore;

    #[async_trait]
    impl ProfileStore for BrokenStore {
        async fn find(&self, _: UserId) -> Result<Option<ProfileRow>, StoreError> {
            Err(StoreError::Unavailable("connection reset".into()))
        }

        async fn find_without_role(&self, _: UserId) -> Result<Option<ProfileRow>, StoreError> {
            Err(StoreError::Unavailable("connection reset".into()))
        }

        async fn upsert(&self, _: ProfileUpsert) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn transient_failure_returns_in_memory_profile() {
        let u = user(Some("colaborador"));
        let profile = ProfileResolver::new(BrokenStore).resolve(&u).await;
        assert_eq!(profile.id, u.id);
        assert!(profile.is_collaborator());
    }
}
