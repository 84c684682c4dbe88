/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証ロジックは middleware/services 側の責務
 */
use uuid::Uuid;

use crate::repos::user_repo::UserProfile;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user` は password hash / session を含まない projection
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub user: UserProfile,
}

impl AuthCtx {
    pub fn new(user: UserProfile) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}
