use crate::error::{DatabaseError, DatabaseErrorExt};
use crate::manifest::builtin_migrations;
use fxhash::FxHashMap;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

/// A single SurrealQL script owned by one slice, identified by
/// `slice_key:version`. The checksum is computed from the script text when
/// the manifest is assembled, so a script edited after it was applied is
/// detected on the next startup.
#[derive(Debug)]
pub(crate) struct Migration {
    pub slice_key: &'static str,
    pub slice_name: &'static str,
    pub slice_description: Option<&'static str>,
    pub version: &'static str,
    pub script: &'static str,
    pub checksum: String,
    pub is_bootstrap: bool,
}

impl Migration {
    pub(crate) fn new(
        slice_key: &'static str,
        slice_name: &'static str,
        slice_description: Option<&'static str>,
        version: &'static str,
        script: &'static str,
        is_bootstrap: bool,
    ) -> Self {
        Self {
            slice_key,
            slice_name,
            slice_description,
            version,
            script,
            checksum: hex::encode(Sha256::digest(script.as_bytes())),
            is_bootstrap,
        }
    }

    fn key(&self) -> String {
        format!("{}:{}", self.slice_key, self.version)
    }

    fn to_applied(&self) -> AppliedMigration {
        AppliedMigration {
            slice_key: self.slice_key.to_owned(),
            version: self.version.to_owned(),
            checksum: self.checksum.clone(),
        }
    }
}

/// A `migration` table row as recorded by `fn::confirm_migration`.
#[derive(Debug, Deserialize)]
pub(crate) struct AppliedMigration {
    pub slice_key: String,
    pub version: String,
    pub checksum: String,
}

impl AppliedMigration {
    fn key(&self) -> String {
        format!("{}:{}", self.slice_key, self.version)
    }
}

/// Outcome of a migration run, split into scripts executed this time and
/// scripts already present in the bookkeeping table.
#[derive(Debug, Default)]
pub(crate) struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
    pub skipped: Vec<AppliedMigration>,
}

/// Applies the builtin migrations against an activated session.
///
/// Every script runs inside one transaction together with its bookkeeping
/// writes, so a failed statement leaves neither schema fragments nor a
/// confirmation row behind.
pub(crate) struct MigrationRunner {
    db: Surreal<Any>,
}

impl MigrationRunner {
    pub(crate) const fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    pub(crate) async fn run(&self) -> Result<MigrationReport, DatabaseError> {
        let mut report = MigrationReport::default();
        let applied_migrations = self.get_migrations_map().await?;

        for migration in builtin_migrations() {
            if let Some(applied) = applied_migrations.get(&migration.key()) {
                ensure_checksum_match(&migration, &applied.checksum)?;
                report.skipped.push(migration.to_applied());
                continue;
            }

            self.apply_migration(&migration).await?;
            report.applied.push(migration.to_applied());
        }

        Ok(report)
    }

    /// Loads the bookkeeping rows keyed by `slice_key:version`.
    ///
    /// On a fresh datastore the `migration` table does not exist yet and the
    /// select simply yields no rows, so the bootstrap script is picked up by
    /// the regular pending path.
    async fn get_migrations_map(
        &self,
    ) -> Result<FxHashMap<String, AppliedMigration>, DatabaseError> {
        let entries = self
            .db
            .query("SELECT slice AS slice_key, version, checksum FROM migration")
            .await
            .context("Loading applied migrations")?
            .take::<Vec<AppliedMigration>>(0)
            .context("Parsing applied migrations")?;

        Ok(entries
            .into_iter()
            .map(|entry| (entry.key(), entry))
            .collect())
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<(), DatabaseError> {
        // The bootstrap script defines `fn::ensure_slice` itself, so the
        // helper call has to come after the script body there. Everything
        // else registers its slice first.
        let query = if migration.is_bootstrap {
            format!(
                "BEGIN TRANSACTION; \
                {} \
                fn::ensure_slice($slice, $name, $description); \
                RETURN fn::confirm_migration($slice, $version, $checksum); \
                COMMIT TRANSACTION;",
                migration.script
            )
        } else {
            format!(
                "BEGIN TRANSACTION; \
                fn::ensure_slice($slice, $name, $description); \
                {} \
                RETURN fn::confirm_migration($slice, $version, $checksum); \
                COMMIT TRANSACTION;",
                migration.script
            )
        };

        self.db
            .query(query)
            .bind(("slice", migration.slice_key))
            .bind(("name", migration.slice_name))
            .bind(("description", migration.slice_description))
            .bind(("version", migration.version))
            .bind(("checksum", migration.checksum.clone()))
            .await
            .context(format!("Executing migration {}", migration.key()))?
            .check()
            .context(format!("Migration {} was rolled back", migration.key()))?;

        Ok(())
    }
}

fn ensure_checksum_match(
    migration: &Migration,
    applied_checksum: &str,
) -> Result<(), DatabaseError> {
    if migration.checksum == applied_checksum {
        return Ok(());
    }

    Err(DatabaseError::Migration {
        message: format!(
            "Checksum mismatch for migration {}: script has {}, database recorded {}",
            migration.key(),
            migration.checksum,
            applied_checksum
        )
        .into(),
        context: Some("Refusing to start with drifted migration scripts".into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::engine::any::connect;

    #[test]
    fn checksums_are_stable_hex_digests() {
        for migration in builtin_migrations() {
            assert_eq!(migration.checksum.len(), 64, "{}", migration.key());
            assert!(migration.checksum.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn bootstrap_comes_first() {
        let migrations = builtin_migrations();
        assert!(migrations[0].is_bootstrap);
        assert!(migrations.iter().skip(1).all(|m| !m.is_bootstrap));
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        let migration = Migration::new("engine", "Engine", None, "0001", "DEFINE TABLE t;", true);
        let err = ensure_checksum_match(&migration, "deadbeef").unwrap_err();
        assert!(matches!(err, DatabaseError::Migration { .. }));
    }

    #[tokio::test]
    async fn run_applies_once_then_skips() {
        let db = connect("mem://").await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();

        let runner = MigrationRunner::new(db);
        let first = runner.run().await.unwrap();
        assert_eq!(first.applied.len(), builtin_migrations().len());
        assert!(first.skipped.is_empty());

        let second = runner.run().await.unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.skipped.len(), first.applied.len());
    }
}
