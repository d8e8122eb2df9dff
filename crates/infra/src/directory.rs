//! Directory services: clients, accounts, affinity groups and family
//! circles.
//!
//! Every mutating operation stages its audit record in the same atomic unit
//! as the documents it touches. Reads that span both sides of a circle rely
//! on [`add_circle_member`]/[`remove_circle_member`] keeping the holder and
//! member documents in lockstep, so authorization can be answered from the
//! target document alone.
//!
//! [`add_circle_member`]: Directory::add_circle_member
//! [`remove_circle_member`]: Directory::remove_circle_member

use std::collections::BTreeSet;

use chrono::Utc;

use loyalty_audit::{AccountSnapshot, AuditRecord, ConfigSnapshot, GroupSnapshot};
use loyalty_auth::Actor;
use loyalty_circle::{
    CircleConfig, CircleConfigPatch, CircleMember, CircleRole, RelationshipType, add_member,
    remove_member,
};
use loyalty_clients::{AffinityGroup, Client, ClientPatch};
use loyalty_core::{AccountId, ClientId, DomainError, GroupId};
use loyalty_ledger::LoyaltyAccount;

use crate::document_store::{DocumentStore, WriteOp, run_transaction};
use crate::error::ServiceError;
use crate::paths;

/// Read access to a client's data: the client themselves, or a member of
/// the circle the client holds.
pub(crate) fn can_view(actor: &Actor, client_id: ClientId, client: &Client) -> bool {
    if actor.uid == client_id {
        return true;
    }
    client
        .family_circle
        .as_ref()
        .is_some_and(|role| role.members().iter().any(|m| m.client_id == actor.uid))
}

pub struct Directory<S> {
    store: S,
}

impl<S> Directory<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register the authenticated principal as a client.
    ///
    /// The client document is keyed by the principal's uid; registering
    /// twice is a conflict.
    pub async fn register_client(
        &self,
        actor: &Actor,
        name: String,
        email: Option<String>,
        identity_document: Option<String>,
    ) -> Result<Client, ServiceError> {
        run_transaction(&self.store, |txn| {
            let actor = actor.clone();
            let name = name.clone();
            let email = email.clone();
            let identity_document = identity_document.clone();
            Box::pin(async move {
                let now = Utc::now();
                let path = paths::client(actor.uid);
                if txn.get(&path).await?.is_some() {
                    return Err(DomainError::conflict("client already registered").into());
                }

                let client = Client::register(
                    name.clone(),
                    email.clone(),
                    identity_document.clone(),
                    now,
                )?;
                let audit =
                    AuditRecord::client_registered(actor.clone(), actor.uid, client.profile(), now);

                txn.put(path, &client)?;
                txn.put(paths::audit_record(audit.id), &audit)?;
                Ok::<_, ServiceError>(client)
            })
        })
        .await
    }

    pub async fn get_client(
        &self,
        actor: &Actor,
        client_id: ClientId,
    ) -> Result<Client, ServiceError> {
        let client: Client = self
            .store
            .get(&paths::client(client_id))
            .await?
            .ok_or_else(|| DomainError::not_found("client not found"))?
            .decode()?;

        if !can_view(actor, client_id, &client) {
            return Err(DomainError::Forbidden.into());
        }
        Ok(client)
    }

    /// Apply a profile patch. A patch that changes nothing commits no
    /// writes and leaves `updated_at` untouched.
    pub async fn update_client(
        &self,
        actor: &Actor,
        client_id: ClientId,
        patch: ClientPatch,
    ) -> Result<Client, ServiceError> {
        if actor.uid != client_id {
            return Err(DomainError::Forbidden.into());
        }

        run_transaction(&self.store, |txn| {
            let actor = actor.clone();
            let patch = patch.clone();
            Box::pin(async move {
                let now = Utc::now();
                let path = paths::client(client_id);
                let client: Client = txn
                    .get_typed(&path)
                    .await?
                    .ok_or_else(|| DomainError::not_found("client not found"))?;

                let (client, diff) = client.apply_patch(patch.clone(), now)?;
                if let Some(diff) = diff {
                    let audit = AuditRecord::client_updated(actor.clone(), client_id, diff, now);
                    txn.put(path, &client)?;
                    txn.put(paths::audit_record(audit.id), &audit)?;
                }
                Ok::<_, ServiceError>(client)
            })
        })
        .await
    }

    /// Open a loyalty account for the client, starting at zero points.
    pub async fn create_account(
        &self,
        actor: &Actor,
        client_id: ClientId,
        account_name: String,
    ) -> Result<(AccountId, LoyaltyAccount), ServiceError> {
        if actor.uid != client_id {
            return Err(DomainError::Forbidden.into());
        }

        run_transaction(&self.store, |txn| {
            let actor = actor.clone();
            let account_name = account_name.clone();
            Box::pin(async move {
                let now = Utc::now();
                let client_path = paths::client(client_id);
                let mut client: Client = txn
                    .get_typed(&client_path)
                    .await?
                    .ok_or_else(|| DomainError::not_found("client not found"))?;

                let account = LoyaltyAccount::open(account_name.clone(), now)?;
                let account_id = AccountId::new();
                client.note_balance(account_id, account.points, now);

                let audit = AuditRecord::account_created(
                    actor.clone(),
                    client_id,
                    account_id,
                    AccountSnapshot {
                        account_name: account.account_name.clone(),
                        points: account.points,
                    },
                    now,
                );

                txn.put(paths::account(client_id, account_id), &account)?;
                txn.put(client_path, &client)?;
                txn.put(paths::audit_record(audit.id), &audit)?;
                Ok::<_, ServiceError>((account_id, account))
            })
        })
        .await
    }

    pub async fn list_accounts(
        &self,
        actor: &Actor,
        client_id: ClientId,
    ) -> Result<Vec<(AccountId, LoyaltyAccount)>, ServiceError> {
        self.get_client(actor, client_id).await?;

        let docs = self.store.list(&paths::accounts(client_id)).await?;
        let mut accounts = Vec::with_capacity(docs.len());
        for doc in docs {
            let account_id: AccountId = doc.path.doc_id().parse()?;
            accounts.push((account_id, doc.decode::<LoyaltyAccount>()?));
        }
        accounts.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at));
        Ok(accounts)
    }

    pub async fn get_account(
        &self,
        actor: &Actor,
        client_id: ClientId,
        account_id: AccountId,
    ) -> Result<LoyaltyAccount, ServiceError> {
        self.get_client(actor, client_id).await?;

        let account = self
            .store
            .get(&paths::account(client_id, account_id))
            .await?
            .ok_or_else(|| DomainError::not_found("account not found"))?
            .decode()?;
        Ok(account)
    }

    /// Create an affinity group. Groups are platform-wide; any client may
    /// create one.
    pub async fn create_group(
        &self,
        actor: &Actor,
        name: String,
        description: String,
    ) -> Result<(GroupId, AffinityGroup), ServiceError> {
        let now = Utc::now();
        let group = AffinityGroup::create(name, description, now)?;
        let group_id = GroupId::new();

        let audit = AuditRecord::group_created(
            actor.clone(),
            group_id,
            GroupSnapshot {
                name: group.name.clone(),
                description: group.description.clone(),
            },
            now,
        );

        // Fresh v7 id, no reads to pin: a bare commit suffices.
        self.store
            .commit(
                vec![],
                vec![
                    WriteOp::put(paths::group(group_id), &group)?,
                    WriteOp::put(paths::audit_record(audit.id), &audit)?,
                ],
            )
            .await?;
        Ok((group_id, group))
    }

    pub async fn list_groups(&self) -> Result<Vec<(GroupId, AffinityGroup)>, ServiceError> {
        let docs = self.store.list(paths::GROUPS).await?;
        let mut groups = Vec::with_capacity(docs.len());
        for doc in docs {
            let group_id: GroupId = doc.path.doc_id().parse()?;
            groups.push((group_id, doc.decode::<AffinityGroup>()?));
        }
        groups.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at));
        Ok(groups)
    }

    pub async fn get_group(&self, group_id: GroupId) -> Result<AffinityGroup, ServiceError> {
        let group = self
            .store
            .get(&paths::group(group_id))
            .await?
            .ok_or_else(|| DomainError::not_found("affinity group not found"))?
            .decode()?;
        Ok(group)
    }

    /// Join an affinity group. Already a member is a silent no-op.
    pub async fn join_group(
        &self,
        actor: &Actor,
        client_id: ClientId,
        group_id: GroupId,
    ) -> Result<BTreeSet<GroupId>, ServiceError> {
        if actor.uid != client_id {
            return Err(DomainError::Forbidden.into());
        }

        run_transaction(&self.store, |txn| {
            let actor = actor.clone();
            Box::pin(async move {
                let now = Utc::now();
                let client_path = paths::client(client_id);
                let mut client: Client = txn
                    .get_typed(&client_path)
                    .await?
                    .ok_or_else(|| DomainError::not_found("client not found"))?;
                txn.get_typed::<AffinityGroup>(&paths::group(group_id))
                    .await?
                    .ok_or_else(|| DomainError::not_found("affinity group not found"))?;

                if let Some((before, after)) = client.join_group(group_id, now) {
                    let audit = AuditRecord::group_membership_changed(
                        actor.clone(),
                        client_id,
                        group_id,
                        before,
                        after,
                        now,
                    );
                    txn.put(client_path, &client)?;
                    txn.put(paths::audit_record(audit.id), &audit)?;
                }
                Ok::<_, ServiceError>(client.affinity_group_ids.clone())
            })
        })
        .await
    }

    /// Leave an affinity group. Not a member is a silent no-op.
    pub async fn leave_group(
        &self,
        actor: &Actor,
        client_id: ClientId,
        group_id: GroupId,
    ) -> Result<BTreeSet<GroupId>, ServiceError> {
        if actor.uid != client_id {
            return Err(DomainError::Forbidden.into());
        }

        run_transaction(&self.store, |txn| {
            let actor = actor.clone();
            Box::pin(async move {
                let now = Utc::now();
                let client_path = paths::client(client_id);
                let mut client: Client = txn
                    .get_typed(&client_path)
                    .await?
                    .ok_or_else(|| DomainError::not_found("client not found"))?;
                txn.get_typed::<AffinityGroup>(&paths::group(group_id))
                    .await?
                    .ok_or_else(|| DomainError::not_found("affinity group not found"))?;

                if let Some((before, after)) = client.leave_group(group_id, now) {
                    let audit = AuditRecord::group_membership_changed(
                        actor.clone(),
                        client_id,
                        group_id,
                        before,
                        after,
                        now,
                    );
                    txn.put(client_path, &client)?;
                    txn.put(paths::audit_record(audit.id), &audit)?;
                }
                Ok::<_, ServiceError>(client.affinity_group_ids.clone())
            })
        })
        .await
    }

    /// Add a member to the actor's own family circle.
    ///
    /// Both client documents change in one unit: the holder gains the
    /// member entry, the member gains the back-pointing role.
    pub async fn add_circle_member(
        &self,
        actor: &Actor,
        client_id: ClientId,
        member_id: ClientId,
        relationship_type: RelationshipType,
    ) -> Result<CircleMember, ServiceError> {
        if actor.uid != client_id {
            return Err(DomainError::Forbidden.into());
        }
        // Checked before any store access.
        if member_id == client_id {
            return Err(DomainError::CannotAddSelf.into());
        }

        run_transaction(&self.store, |txn| {
            let actor = actor.clone();
            let relationship_type = relationship_type.clone();
            Box::pin(async move {
                let now = Utc::now();
                let holder_path = paths::client(client_id);
                let member_path = paths::client(member_id);

                let mut holder: Client = txn
                    .get_typed(&holder_path)
                    .await?
                    .ok_or_else(|| DomainError::not_found("client not found"))?;
                let mut member: Client = txn
                    .get_typed(&member_path)
                    .await?
                    .ok_or_else(|| DomainError::not_found("member client not found"))?;

                let (holder_role, member_role) = add_member(
                    client_id,
                    member_id,
                    relationship_type.clone(),
                    now,
                    holder.family_circle.take(),
                    member.family_circle.take(),
                )?;
                holder.family_circle = Some(holder_role);
                holder.updated_at = now;
                member.family_circle = Some(member_role);
                member.updated_at = now;

                let entry = CircleMember {
                    client_id: member_id,
                    relationship_type: relationship_type.clone(),
                    joined_at: now,
                };
                let audit =
                    AuditRecord::circle_member_added(actor.clone(), client_id, entry.clone(), now);

                txn.put(holder_path, &holder)?;
                txn.put(member_path, &member)?;
                txn.put(paths::audit_record(audit.id), &audit)?;
                Ok::<_, ServiceError>(entry)
            })
        })
        .await
    }

    /// Remove a member from the actor's own family circle.
    pub async fn remove_circle_member(
        &self,
        actor: &Actor,
        client_id: ClientId,
        member_id: ClientId,
    ) -> Result<CircleMember, ServiceError> {
        if actor.uid != client_id {
            return Err(DomainError::Forbidden.into());
        }

        run_transaction(&self.store, |txn| {
            let actor = actor.clone();
            Box::pin(async move {
                let now = Utc::now();
                let holder_path = paths::client(client_id);
                let member_path = paths::client(member_id);

                let mut holder: Client = txn
                    .get_typed(&holder_path)
                    .await?
                    .ok_or_else(|| DomainError::not_found("client not found"))?;
                let mut member: Client = txn
                    .get_typed(&member_path)
                    .await?
                    .ok_or_else(|| DomainError::not_found("member client not found"))?;

                let Some(CircleRole::Holder { members }) = holder.family_circle.as_ref() else {
                    return Err(DomainError::not_found(format!(
                        "client {client_id} has no family circle"
                    ))
                    .into());
                };
                let removed = members
                    .iter()
                    .find(|m| m.client_id == member_id)
                    .cloned()
                    .ok_or_else(|| {
                        DomainError::not_found(format!(
                            "client {member_id} is not a member of this family circle"
                        ))
                    })?;

                let (holder_role, cleared) =
                    remove_member(client_id, member_id, holder.family_circle.take())?;
                holder.family_circle = Some(holder_role);
                holder.updated_at = now;
                member.family_circle = cleared;
                member.updated_at = now;

                let audit = AuditRecord::circle_member_removed(
                    actor.clone(),
                    client_id,
                    removed.clone(),
                    now,
                );

                txn.put(holder_path, &holder)?;
                txn.put(member_path, &member)?;
                txn.put(paths::audit_record(audit.id), &audit)?;
                Ok::<_, ServiceError>(removed)
            })
        })
        .await
    }

    /// The client's circle role, `None` for a circle-less client.
    pub async fn view_circle(
        &self,
        actor: &Actor,
        client_id: ClientId,
    ) -> Result<Option<CircleRole>, ServiceError> {
        let client = self.get_client(actor, client_id).await?;
        Ok(client.family_circle)
    }

    /// The per-account delegation config. An account that has never been
    /// configured reads as all-denied.
    pub async fn get_circle_config(
        &self,
        actor: &Actor,
        client_id: ClientId,
        account_id: AccountId,
    ) -> Result<CircleConfig, ServiceError> {
        let account = self.get_account(actor, client_id, account_id).await?;

        let config = self
            .store
            .get(&paths::circle_config(client_id, account_id))
            .await?
            .map(|doc| doc.decode::<CircleConfig>())
            .transpose()?;
        Ok(config.unwrap_or_else(|| CircleConfig::denied(client_id, account.created_at)))
    }

    /// Flip delegation switches on one account. Holder only.
    pub async fn update_circle_config(
        &self,
        actor: &Actor,
        client_id: ClientId,
        account_id: AccountId,
        patch: CircleConfigPatch,
    ) -> Result<CircleConfig, ServiceError> {
        if actor.uid != client_id {
            return Err(DomainError::Forbidden.into());
        }
        if patch.allow_member_credits.is_none() && patch.allow_member_debits.is_none() {
            return self.get_circle_config(actor, client_id, account_id).await;
        }

        run_transaction(&self.store, |txn| {
            let actor = actor.clone();
            Box::pin(async move {
                let now = Utc::now();
                let account: LoyaltyAccount = txn
                    .get_typed(&paths::account(client_id, account_id))
                    .await?
                    .ok_or_else(|| DomainError::not_found("account not found"))?;

                let config_path = paths::circle_config(client_id, account_id);
                let existing: Option<CircleConfig> = txn.get_typed(&config_path).await?;
                let before = existing.as_ref().map(|c| ConfigSnapshot {
                    allow_member_credits: c.allow_member_credits,
                    allow_member_debits: c.allow_member_debits,
                });

                let base =
                    existing.unwrap_or_else(|| CircleConfig::denied(client_id, account.created_at));
                let config = base.apply(patch, actor.uid, now);

                let audit = AuditRecord::circle_config_updated(
                    actor.clone(),
                    client_id,
                    account_id,
                    before,
                    ConfigSnapshot {
                        allow_member_credits: config.allow_member_credits,
                        allow_member_debits: config.allow_member_debits,
                    },
                    now,
                );

                txn.put(config_path, &config)?;
                txn.put(paths::audit_record(audit.id), &audit)?;
                Ok::<_, ServiceError>(config)
            })
        })
        .await
    }
}
