use crate::{Db, StoreError};
use domain::{Document, Fields};
use sqlx::Row;

impl Db {
    pub async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT fields FROM documents WHERE collection = ? AND doc_id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("fields")?;
        let fields: Fields = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Malformed(format!("{}/{}: {}", collection, id, e)))?;

        Ok(Some(Document::new(id, fields)))
    }

    // Seeding only; the dispatcher never writes.
    pub async fn put_document(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(fields)
            .map_err(|e| StoreError::Malformed(format!("{}/{}: {}", collection, id, e)))?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, doc_id, fields)
            VALUES (?, ?, ?)
            ON CONFLICT(collection, doc_id) DO UPDATE SET
                fields = excluded.fields,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(raw)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Db, DocumentStore};
    use serde_json::json;

    fn fields(v: serde_json::Value) -> domain::Fields {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_missing_document_is_none() {
        let db = Db::new("sqlite::memory:").await.unwrap();
        assert!(db.get("sites", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let db = Db::new("sqlite::memory:").await.unwrap();
        db.put_document("sites", "s1", &fields(json!({ "userId": "u1", "siteName": "My Blog" })))
            .await
            .unwrap();

        let doc = db.get("sites", "s1").await.unwrap().unwrap();
        assert_eq!(doc.id, "s1");
        assert_eq!(doc.str_field("userId"), Some("u1"));
        assert_eq!(doc.str_field("siteName"), Some("My Blog"));

        // same id in another collection is a different document
        assert!(db.get("users", "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = Db::new("sqlite::memory:").await.unwrap();
        db.put_document("users", "u1", &fields(json!({ "fcmToken": "old" })))
            .await
            .unwrap();
        db.put_document("users", "u1", &fields(json!({ "fcmToken": "new" })))
            .await
            .unwrap();

        let doc = db.get_document("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.str_field("fcmToken"), Some("new"));
    }
}
