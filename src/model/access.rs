use crate::{
    model::{
        ModelManager,
        error::{DatabaseError, DatabaseResult},
    },
    web::AuthenticatedUser,
};

/// Resources that belong to one user: classes and courses to their teacher, exercises to their
/// author, attempts to their student, accounts to themselves.
#[async_trait::async_trait]
pub trait HasOwner {
    type OwnerId: PartialEq + Send + Sync;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId>;
}

/// `Forbidden` unless `expected` owns `resource`. Admins pass every check.
pub async fn check_access<T, O>(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    resource: &T,
    expected: O,
) -> DatabaseResult<()>
where
    T: HasOwner<OwnerId = O> + Sync,
    O: PartialEq + Send + Sync,
{
    if actor.is_admin() {
        return Ok(());
    }

    let owner = resource.get_owner_id(mm, actor).await?;
    if owner == expected {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}
