use tracing::trace;

use super::database::Database;
use crate::digest::Digest;
use crate::storable::commit::Commit;
use crate::storable::ObjectKind;
use crate::{Error, Result};

impl Database {
    /// Write a commit of `tree_id` with the configured identity as author and committer.
    ///
    /// The tree and every parent must already be stored with the right kind.
    pub fn write_commit(
        &self,
        tree_id: &Digest,
        parents: &[Digest],
        message: &str,
    ) -> Result<Digest> {
        trace!(tree = %tree_id, ?parents, %message, "Starting commit");
        self.expect_kind(tree_id, ObjectKind::Tree)?;
        for parent in parents {
            self.expect_kind(parent, ObjectKind::Commit)?;
        }

        let identity = self.config().identity.clone();
        let commit = Commit::new(
            *tree_id,
            parents.to_vec(),
            identity.clone(),
            identity,
            message,
        );
        self.store(&commit)
    }

    fn expect_kind(&self, oid: &Digest, expected: ObjectKind) -> Result<()> {
        let actual = self.type_of(oid)?;
        if actual != expected {
            return Err(Error::WrongObjectType {
                oid: *oid,
                expected,
                actual,
            });
        }
        Ok(())
    }
}
