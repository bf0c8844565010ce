// Organization tree lookups
// Parents come from the client's organization tree (ad_tree of type 'OO').

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::Organization;
use tracing::instrument;

pub struct OrganizationRepository {
    pool: DbPool,
}

impl OrganizationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Find an organization together with its tree parent
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Organization>, DatabaseError> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.ad_org_id AS id, o.name AS name, tn.parent_id AS parent_id,
                   o.ad_client_id AS client_id
            FROM ad_org o
            LEFT JOIN ad_treenode tn
                ON tn.node_id = o.ad_org_id
               AND tn.ad_tree_id IN (
                    SELECT t.ad_tree_id
                    FROM ad_tree t
                    WHERE t.treetype = 'OO'
                      AND t.ad_client_id = o.ad_client_id
               )
            WHERE o.ad_org_id = $1
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await?;

        tracing::debug!(
            organization_id = id,
            found = organization.is_some(),
            "Looked up organization"
        );
        Ok(organization)
    }
}
