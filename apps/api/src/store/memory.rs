use std::sync::Mutex;

use super::*;

/// In-memory `PortfolioStore` for tests.
#[derive(Default)]
pub struct MemoryPortfolioStore {
    users: Mutex<Vec<User>>,
    records: Mutex<PortfolioRecords>,
    messages: Mutex<Vec<Message>>,
}

impl MemoryPortfolioStore {
    pub fn with_user(user: User) -> Self {
        let store = Self::default();
        store.users.lock().unwrap().push(user);
        store
    }

    pub fn set_records(&self, records: PortfolioRecords) {
        *self.records.lock().unwrap() = records;
    }

    pub fn update_user(&self, user: User) {
        let mut users = self.users.lock().unwrap();
        users.retain(|u| u.id != user.id);
        users.push(user);
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl PortfolioStore for MemoryPortfolioStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.username == user.username || u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(DuplicateRecord("Email already registered".into()).into());
        }
        users.push(user.clone());
        Ok(())
    }

    async fn load_records(&self, owner: Uuid) -> Result<PortfolioRecords> {
        let all = self.records.lock().unwrap();
        Ok(PortfolioRecords {
            experiences: all.experiences.iter().filter(|r| r.user_id == owner).cloned().collect(),
            educations: all.educations.iter().filter(|r| r.user_id == owner).cloned().collect(),
            projects: all.projects.iter().filter(|r| r.user_id == owner).cloned().collect(),
            skills: all.skills.iter().filter(|r| r.user_id == owner).cloned().collect(),
            certifications: all
                .certifications
                .iter()
                .filter(|r| r.user_id == owner)
                .cloned()
                .collect(),
            awards: all.awards.iter().filter(|r| r.user_id == owner).cloned().collect(),
        })
    }

    async fn find_skill_by_name(&self, owner: Uuid, name: &str) -> Result<Option<Skill>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .skills
            .iter()
            .find(|s| s.user_id == owner && s.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn create_skill(&self, skill: &Skill) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if records
            .skills
            .iter()
            .any(|s| s.user_id == skill.user_id && s.name.eq_ignore_ascii_case(&skill.name))
        {
            return Err(DuplicateRecord(format!("Skill '{}' already exists", skill.name)).into());
        }
        records.skills.push(skill.clone());
        Ok(())
    }

    async fn create_message(&self, message: &Message) -> Result<()> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn mark_messages_read(&self, recipient: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let mut updated = Vec::new();
        for message in self.messages.lock().unwrap().iter_mut() {
            if message.recipient_user_id == recipient && ids.contains(&message.id) {
                message.is_read = true;
                updated.push(message.id);
            }
        }
        Ok(updated)
    }
}

mod tests {
    use chrono::Utc;

    use super::*;
    use crate::errors::AppError;
    use crate::models::user::sample_user;

    fn skill(owner: Uuid, name: &str) -> Skill {
        Skill {
            id: Uuid::new_v4(),
            user_id: owner,
            name: name.into(),
            category: "Languages".into(),
            proficiency: 80,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_colliding_skill_insert_is_conflict() {
        let store = MemoryPortfolioStore::default();
        let owner = Uuid::new_v4();
        store.create_skill(&skill(owner, "Rust")).await.unwrap();
        store.create_skill(&skill(Uuid::new_v4(), "Rust")).await.unwrap();

        let err = store.create_skill(&skill(owner, "rust")).await.unwrap_err();
        assert!(err.is::<DuplicateRecord>());
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_colliding_user_insert_is_conflict() {
        let store = MemoryPortfolioStore::default();
        let first = sample_user();
        store.create_user(&first).await.unwrap();

        let second = User {
            id: Uuid::new_v4(),
            username: "ADA@example.com".into(),
            email: "ADA@example.com".into(),
            ..first
        };
        let err = store.create_user(&second).await.unwrap_err();
        match AppError::from(err) {
            AppError::Conflict(msg) => assert_eq!(msg, "Email already registered"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
