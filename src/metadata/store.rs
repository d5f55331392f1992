use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Comment, Game, MetadataError, MetadataStore, User};

/// In-memory snapshot, flushed to the three JSON files under `data_dir` after
/// every mutating call. Comments are keyed by `(game_name, username)` so the
/// at-most-one-per-pair invariant is structural rather than checked by hand.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct Snapshot {
    users: HashMap<String, User>,
    games: HashMap<String, Game>,
    #[serde(with = "comment_map")]
    comments: HashMap<(String, String), Comment>,
}

/// `(String, String)` isn't a valid JSON object key, so comments are
/// (de)serialized as a flat `Vec<Comment>` on disk and rekeyed on load.
mod comment_map {
    use super::Comment;
    use std::collections::HashMap;

    pub fn serialize<S: serde::Serializer>(
        map: &HashMap<(String, String), Comment>,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        let list: Vec<&Comment> = map.values().collect();
        serde::Serialize::serialize(&list, ser)
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        de: D,
    ) -> Result<HashMap<(String, String), Comment>, D::Error> {
        let list: Vec<Comment> = serde::Deserialize::deserialize(de)?;
        Ok(list
            .into_iter()
            .map(|c| ((c.game_name.clone(), c.username.clone()), c))
            .collect())
    }
}

/// JSON-file-backed [`MetadataStore`] implementation. The only backend this
/// crate ships: the trait exists so callers never depend on that choice.
pub struct JsonMetadataStore {
    data_dir: PathBuf,
    storage_dir: PathBuf,
    inner: Mutex<Snapshot>,
}

impl JsonMetadataStore {
    /// `base` is the directory holding `db/data` (metadata) and `db/storage`
    /// (package store), per §6's persisted layout.
    pub fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            data_dir: base.join("db").join("data"),
            storage_dir: base.join("db").join("storage"),
            inner: Mutex::new(Snapshot::default()),
        }
    }

    fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    fn games_path(&self) -> PathBuf {
        self.data_dir.join("games.json")
    }

    fn comments_path(&self) -> PathBuf {
        self.data_dir.join("comments.json")
    }

    fn load_json<T: Default + serde::de::DeserializeOwned>(path: &Path) -> T {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    fn flush(&self, snapshot: &Snapshot) -> Result<(), MetadataError> {
        let users: HashMap<&String, &User> = snapshot.users.iter().collect();
        let games: HashMap<&String, &Game> = snapshot.games.iter().collect();
        let comments: Vec<&Comment> = snapshot.comments.values().collect();

        std::fs::write(self.users_path(), serde_json::to_vec_pretty(&users)?)?;
        std::fs::write(self.games_path(), serde_json::to_vec_pretty(&games)?)?;
        std::fs::write(self.comments_path(), serde_json::to_vec_pretty(&comments)?)?;
        Ok(())
    }
}

impl From<serde_json::Error> for MetadataError {
    fn from(e: serde_json::Error) -> Self {
        MetadataError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[async_trait]
impl MetadataStore for JsonMetadataStore {
    async fn initialize_storage(&self) -> Result<(), MetadataError> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.storage_dir)?;

        let users: HashMap<String, User> = Self::load_json(&self.users_path());
        let games: HashMap<String, Game> = Self::load_json(&self.games_path());
        let comments: Vec<Comment> = Self::load_json(&self.comments_path());

        let mut guard = self.inner.lock().await;
        guard.users = users;
        guard.games = games;
        guard.comments = comments
            .into_iter()
            .map(|c| ((c.game_name.clone(), c.username.clone()), c))
            .collect();
        Ok(())
    }

    async fn get_user(&self, username: &str) -> Option<User> {
        self.inner.lock().await.users.get(username).cloned()
    }

    async fn register_user(&self, username: &str, password: &str) -> Result<(), MetadataError> {
        let mut guard = self.inner.lock().await;
        if guard.users.contains_key(username) {
            return Err(MetadataError::UserExists(username.to_string()));
        }
        guard.users.insert(
            username.to_string(),
            User {
                username: username.to_string(),
                password: password.to_string(),
                games: Vec::new(),
                games_own: Vec::new(),
            },
        );
        self.flush(&guard)
    }

    async fn authenticate_user(&self, username: &str, password: &str) -> Result<(), MetadataError> {
        let guard = self.inner.lock().await;
        match guard.users.get(username) {
            Some(user) if user.password == password => Ok(()),
            Some(_) => Err(MetadataError::InvalidCredentials),
            None => Err(MetadataError::InvalidCredentials),
        }
    }

    async fn list_games(&self) -> Vec<Game> {
        self.inner.lock().await.games.values().cloned().collect()
    }

    async fn get_game(&self, game_name: &str) -> Option<Game> {
        self.inner.lock().await.games.get(game_name).cloned()
    }

    async fn upsert_game(&self, game: Game) -> Result<(), MetadataError> {
        let mut guard = self.inner.lock().await;
        guard.games.insert(game.game_name.clone(), game);
        self.flush(&guard)
    }

    async fn remove_game(&self, game_name: &str) -> Result<(), MetadataError> {
        let mut guard = self.inner.lock().await;
        if guard.games.remove(game_name).is_none() {
            return Err(MetadataError::NoSuchGame(game_name.to_string()));
        }
        guard
            .comments
            .retain(|(game, _), _| game != game_name);
        for user in guard.users.values_mut() {
            user.games.retain(|g| g != game_name);
            user.games_own.retain(|g| g != game_name);
        }
        self.flush(&guard)
    }

    async fn add_comment(&self, comment: Comment) -> Result<(), MetadataError> {
        let mut guard = self.inner.lock().await;
        let key = (comment.game_name.clone(), comment.username.clone());
        guard.comments.insert(key, comment);
        self.flush(&guard)
    }

    async fn list_comments(&self, game_name: &str) -> Vec<Comment> {
        self.inner
            .lock()
            .await
            .comments
            .values()
            .filter(|c| c.game_name == game_name)
            .cloned()
            .collect()
    }

    async fn record_download(&self, username: &str, game_name: &str) -> Result<(), MetadataError> {
        let mut guard = self.inner.lock().await;
        let user = guard
            .users
            .get_mut(username)
            .ok_or_else(|| MetadataError::NoSuchUser(username.to_string()))?;
        if !user.games.iter().any(|g| g == game_name) {
            user.games.push(game_name.to_string());
        }
        self.flush(&guard)
    }

    async fn record_authorship(&self, username: &str, game_name: &str) -> Result<(), MetadataError> {
        let mut guard = self.inner.lock().await;
        let user = guard
            .users
            .get_mut(username)
            .ok_or_else(|| MetadataError::NoSuchUser(username.to_string()))?;
        if !user.games_own.iter().any(|g| g == game_name) {
            user.games_own.push(game_name.to_string());
        }
        self.flush(&guard)
    }

    async fn prune_game_references(&self, game_name: &str) {
        let mut guard = self.inner.lock().await;
        for user in guard.users.values_mut() {
            user.games.retain(|g| g != game_name);
            user.games_own.retain(|g| g != game_name);
        }
        guard.comments.retain(|(game, _), _| game != game_name);
        let _ = self.flush(&guard);
    }

    fn ensure_game_storage_dir(&self, game_name: &str) -> PathBuf {
        let dir = self.storage_dir.join(game_name);
        let _ = std::fs::create_dir_all(&dir);
        dir
    }

    fn storage_root(&self) -> &Path {
        &self.storage_dir
    }
}
