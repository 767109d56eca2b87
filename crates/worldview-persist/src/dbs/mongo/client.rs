use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};
use worldview_types::{validate_thread_id, ChatMessage};

use super::models::MongoThread;
use crate::error::{PersistError, Result};
use crate::models::ThreadRecord;
use crate::trait_store::ThreadStore;

#[derive(Clone)]
pub struct MongoThreadStore {
    collection: Collection<MongoThread>,
}

impl MongoThreadStore {
    /// Connect to MongoDB and use the `threads` collection of `database`
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        Ok(Self::new(&client, database))
    }

    pub fn new(client: &Client, database: &str) -> Self {
        let collection = client.database(database).collection("threads");
        Self { collection }
    }
}

#[async_trait]
impl ThreadStore for MongoThreadStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        validate_thread_id(thread_id)?;
        let found = self.collection.find_one(doc! { "_id": thread_id }).await?;
        Ok(found.map(Into::into))
    }

    async fn save(&self, thread_id: &str, messages: Vec<ChatMessage>) -> Result<ThreadRecord> {
        let previous = self.load(thread_id).await?;
        let record = ThreadRecord::committed(previous.as_ref(), thread_id, messages);

        let document: MongoThread = record.clone().into();
        self.collection
            .replace_one(doc! { "_id": thread_id }, document)
            .upsert(true)
            .await?;

        Ok(record)
    }

    async fn delete(&self, thread_id: &str) -> Result<bool> {
        validate_thread_id(thread_id)?;
        let result = self.collection.delete_one(doc! { "_id": thread_id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_threads(&self, limit: usize) -> Result<Vec<ThreadRecord>> {
        // a zero limit means "no limit" to MongoDB
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let threads: Vec<MongoThread> = self
            .collection
            .find(doc! {})
            .sort(doc! { "updated_at": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        Ok(threads.into_iter().map(Into::into).collect())
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}
