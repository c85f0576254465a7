//! MembershipWorkflow - Ciclo di vita di gruppi, admin, membri e richieste
//!
//! Ogni operazione valida e autorizza prima di scrivere; le notifiche partono
//! solo dopo che la scrittura sul database è stata confermata.

use super::error::MembershipError;
use super::notify::{NotificationKind, NotificationSink};
use crate::dtos::{
    CreateMessageDTO, EnrichedRequestDTO, GroupDTO, GroupDetailDTO, GroupRequestDTO,
    InvitationResultDTO, LeaveGroupDTO, RenameGroupDTO, UserSummaryDTO,
};
use crate::entities::{Group, GroupRequest, RequestKind, RequestStatus, User};
use crate::repositories::user::normalize_email;
use crate::repositories::{
    DecisionOutcome, Delete, GroupRepository, GroupRequestRepository, Read, ReadMany, Update,
    UserRepository,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Identità di chi invoca un'operazione, passata esplicitamente a ogni chiamata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub email: String,
}

impl Caller {
    pub fn new(user_id: i64, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.email.clone())
    }
}

#[derive(Clone)]
pub struct MembershipWorkflow {
    users: UserRepository,
    groups: GroupRepository,
    requests: GroupRequestRepository,
    sink: Arc<dyn NotificationSink>,
}

impl MembershipWorkflow {
    pub fn new(pool: SqlitePool, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            groups: GroupRepository::new(pool.clone()),
            requests: GroupRequestRepository::new(pool),
            sink,
        }
    }

    /// Crea un gruppo con il chiamante come unico admin e membro, poi invia gli inviti.
    /// Gli inviti non validi vengono scartati e riportati in `skipped`.
    #[instrument(skip(self, caller, invites), fields(user_id = caller.user_id))]
    pub async fn create_group(
        &self,
        caller: &Caller,
        name: &str,
        invites: &[String],
    ) -> Result<(Group, InvitationResultDTO), MembershipError> {
        debug!("Creating group");
        let name = name.trim();
        if name.is_empty() {
            warn!("Empty group name");
            return Err(MembershipError::Validation("Group name is required"));
        }

        let creator = self.load_caller(caller).await?;
        if creator.group_id.is_some() {
            warn!("Creator already belongs to group {:?}", creator.group_id);
            return Err(MembershipError::Conflict("You already belong to a group"));
        }

        let group = self
            .groups
            .create_with_admin(name, &creator.id)
            .await
            .map_err(|e| match MembershipError::from(e) {
                MembershipError::Conflict(_) => MembershipError::Conflict("Group name already taken"),
                other => other,
            })?
            // il creatore è entrato in un altro gruppo nel frattempo
            .ok_or(MembershipError::Conflict("You already belong to a group"))?;

        info!("Group {} created", group.id);

        let result = self.send_invites(&group, caller.user_id, invites).await;
        Ok((group, result))
    }

    /// Richieste PENDING di tutti i gruppi amministrati dal chiamante
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn list_pending_requests(
        &self,
        caller: &Caller,
    ) -> Result<Vec<EnrichedRequestDTO>, MembershipError> {
        debug!("Listing pending requests");
        let administered = self.groups.find_administered_group_ids(&caller.user_id).await?;
        if administered.is_empty() {
            warn!("Caller does not administer any group");
            return Err(MembershipError::NotFound("You do not administer any group"));
        }

        let pending = self.requests.find_pending_for_admin(&caller.user_id).await?;
        if pending.is_empty() {
            return Err(MembershipError::NotFound("No pending requests"));
        }

        info!("Found {} pending requests", pending.len());
        self.enrich(pending).await
    }

    /// Inviti PENDING ricevuti dal chiamante
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn list_my_invitations(
        &self,
        caller: &Caller,
    ) -> Result<Vec<EnrichedRequestDTO>, MembershipError> {
        let invites = self
            .requests
            .find_pending_invites_for_user(&caller.user_id)
            .await?;
        debug!("Found {} pending invitations", invites.len());
        self.enrich(invites).await
    }

    /// Il chiamante chiede di entrare in un gruppo; gli admin vengono notificati
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn request_to_join(
        &self,
        caller: &Caller,
        group_id: i64,
    ) -> Result<GroupRequest, MembershipError> {
        debug!("Creating join request");
        let group = self.find_group(group_id).await?;
        let user = self.load_caller(caller).await?;

        if user.is_member_of(group_id) {
            return Err(MembershipError::Conflict("You are already a member of this group"));
        }
        if user.group_id.is_some() {
            return Err(MembershipError::Conflict("You already belong to a group"));
        }

        let request = self
            .requests
            .create_join(&user.id, &group_id)
            .await
            .map_err(|e| match MembershipError::from(e) {
                MembershipError::Conflict(_) => {
                    MembershipError::Conflict("A pending request for this group already exists")
                }
                other => other,
            })?;

        info!("Join request {} created", request.id);

        // la richiesta è già confermata, senza admin non c'è nessuno da notificare
        let admins = match self.groups.find_admin_ids(&group_id).await {
            Ok(admins) => admins,
            Err(e) => {
                error!("Admin lookup for group {} failed: {}", group_id, e);
                Vec::new()
            }
        };
        let payload = json!({
            "requestId": request.id,
            "groupId": group.id,
            "groupName": group.name,
            "requester": UserSummaryDTO::from(user),
        });
        for admin_id in admins {
            self.emit(admin_id, NotificationKind::JoinRequest, payload.clone())
                .await;
        }

        Ok(request)
    }

    /// Decisione su una richiesta tramite id.
    /// Gli inviti li decide l'invitato, le richieste di adesione un admin del gruppo.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn decide_request(
        &self,
        caller: &Caller,
        request_id: i64,
        decision: RequestStatus,
    ) -> Result<GroupRequest, MembershipError> {
        debug!("Deciding request");
        Self::check_decision(decision)?;

        let request = self
            .requests
            .read(&request_id)
            .await?
            .ok_or(MembershipError::NotFound("Request not found"))?;

        if request.status.is_terminal() {
            warn!("Request {} already {}", request.id, request.status);
            return Err(MembershipError::Conflict("Request has already been decided"));
        }

        let authorized = match request.kind {
            RequestKind::Invite => request.user_id == caller.user_id,
            RequestKind::Join => self.groups.is_admin(&request.group_id, &caller.user_id).await?,
        };
        if !authorized {
            warn!("Caller cannot decide request {}", request.id);
            return Err(MembershipError::Authorization(
                "You are not allowed to decide this request",
            ));
        }

        self.apply_decision(caller, request, decision).await
    }

    /// L'invitato accetta o rifiuta il proprio invito per un gruppo
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn decide_invitation(
        &self,
        caller: &Caller,
        group_id: i64,
        decision: RequestStatus,
    ) -> Result<GroupRequest, MembershipError> {
        debug!("Deciding invitation");
        Self::check_decision(decision)?;

        let invite = self
            .requests
            .find_pending_invite(&caller.user_id, &group_id)
            .await?
            .ok_or(MembershipError::NotFound("No pending invitation for this group"))?;

        self.apply_decision(caller, invite, decision).await
    }

    /// Invita utenti per email in un gruppo amministrato dal chiamante
    #[instrument(skip(self, caller, emails), fields(user_id = caller.user_id))]
    pub async fn invite_members(
        &self,
        caller: &Caller,
        group_id: i64,
        emails: &[String],
    ) -> Result<InvitationResultDTO, MembershipError> {
        debug!("Inviting {} emails", emails.len());
        let group = self.find_group(group_id).await?;
        self.require_admin(group_id, caller.user_id).await?;
        Ok(self.send_invites(&group, caller.user_id, emails).await)
    }

    /// Rinomina di un gruppo, solo per gli admin
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn rename_group(
        &self,
        caller: &Caller,
        group_id: i64,
        name: &str,
    ) -> Result<Group, MembershipError> {
        debug!("Renaming group");
        let name = name.trim();
        if name.is_empty() {
            return Err(MembershipError::Validation("Group name is required"));
        }

        self.find_group(group_id).await?;
        self.require_admin(group_id, caller.user_id).await?;

        let group = self
            .groups
            .update(
                &group_id,
                &RenameGroupDTO {
                    name: name.to_string(),
                },
            )
            .await
            .map_err(|e| match MembershipError::from(e) {
                MembershipError::Conflict(_) => MembershipError::Conflict("Group name already taken"),
                other => other,
            })?;

        info!("Group {} renamed", group.id);
        Ok(group)
    }

    /// Un admin promuove un membro del gruppo ad admin
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn promote_admin(
        &self,
        caller: &Caller,
        group_id: i64,
        user_id: i64,
    ) -> Result<(), MembershipError> {
        self.find_group(group_id).await?;
        self.require_admin(group_id, caller.user_id).await?;

        let target = self
            .users
            .read(&user_id)
            .await?
            .ok_or(MembershipError::NotFound("User not found"))?;
        if !target.is_member_of(group_id) {
            return Err(MembershipError::NotFound("User is not a member of this group"));
        }

        if !self.groups.add_admin(&group_id, &user_id).await? {
            return Err(MembershipError::Conflict("User is already an admin"));
        }

        info!("User {} promoted to admin of group {}", user_id, group_id);
        Ok(())
    }

    /// Il chiamante esce dal gruppo.
    /// L'ultimo admin non può uscire finché restano altri membri;
    /// se esce l'ultimo membro il gruppo viene eliminato.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn leave_group(
        &self,
        caller: &Caller,
        group_id: i64,
    ) -> Result<LeaveGroupDTO, MembershipError> {
        debug!("Leaving group");
        self.find_group(group_id).await?;

        let user = self.load_caller(caller).await?;
        if !user.is_member_of(group_id) {
            warn!("Caller is not a member of group {}", group_id);
            return Err(MembershipError::Authorization("You are not a member of this group"));
        }

        if self.users.count_members(&group_id).await? <= 1 {
            self.groups.delete(&group_id).await?;
            info!("Last member left, group {} deleted", group_id);
            return Ok(LeaveGroupDTO {
                group_id,
                group_deleted: true,
            });
        }

        let admins = self.groups.find_admin_ids(&group_id).await?;
        if admins == [caller.user_id] {
            warn!("Last admin cannot leave group {}", group_id);
            return Err(MembershipError::Conflict(
                "Promote another admin before leaving the group",
            ));
        }

        if !self.groups.remove_member(&group_id, &caller.user_id).await? {
            return Err(MembershipError::Authorization("You are not a member of this group"));
        }

        info!("User left group {}", group_id);
        Ok(LeaveGroupDTO {
            group_id,
            group_deleted: false,
        })
    }

    /// Eliminazione a cascata, solo per gli admin. I membri rimasti vengono notificati.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn delete_group(&self, caller: &Caller, group_id: i64) -> Result<(), MembershipError> {
        debug!("Deleting group");
        let group = self.find_group(group_id).await?;
        self.require_admin(group_id, caller.user_id).await?;

        let members = self.users.find_many_by_group_id(&group_id).await?;

        if !self.groups.delete(&group_id).await? {
            return Err(MembershipError::NotFound("Group not found"));
        }
        info!("Group {} deleted", group_id);

        let payload = json!({ "groupId": group.id, "groupName": group.name });
        for member in members.iter().filter(|m| m.id != caller.user_id) {
            self.emit(member.id, NotificationKind::GroupDeleted, payload.clone())
                .await;
        }

        Ok(())
    }

    /// Dettaglio del gruppo con admin, membri e richieste approvate
    #[instrument(skip(self))]
    pub async fn get_group(&self, group_id: i64) -> Result<GroupDetailDTO, MembershipError> {
        let group = self.find_group(group_id).await?;

        let admin_ids = self.groups.find_admin_ids(&group_id).await?;
        let admins = self.users.read_many(&admin_ids).await?;
        let members = self.users.find_many_by_group_id(&group_id).await?;
        let approved = self
            .requests
            .find_many_by_group_and_status(&group_id, &RequestStatus::Approved)
            .await?;

        Ok(GroupDetailDTO {
            id: group.id,
            name: group.name,
            created_at: group.created_at,
            admins: admins.into_iter().map(UserSummaryDTO::from).collect(),
            members: members.into_iter().map(UserSummaryDTO::from).collect(),
            approved_requests: approved.into_iter().map(GroupRequestDTO::from).collect(),
        })
    }

    // ************************* HELPERS ************************* //

    fn check_decision(decision: RequestStatus) -> Result<(), MembershipError> {
        if decision.is_terminal() {
            Ok(())
        } else {
            Err(MembershipError::Validation("Status must be APPROVED or REJECTED"))
        }
    }

    async fn load_caller(&self, caller: &Caller) -> Result<User, MembershipError> {
        self.users
            .read(&caller.user_id)
            .await?
            .ok_or(MembershipError::NotFound("User not found"))
    }

    async fn find_group(&self, group_id: i64) -> Result<Group, MembershipError> {
        self.groups
            .read(&group_id)
            .await?
            .ok_or(MembershipError::NotFound("Group not found"))
    }

    async fn require_admin(&self, group_id: i64, user_id: i64) -> Result<(), MembershipError> {
        if self.groups.is_admin(&group_id, &user_id).await? {
            Ok(())
        } else {
            warn!("User {} is not an admin of group {}", user_id, group_id);
            Err(MembershipError::Authorization("You are not an admin of this group"))
        }
    }

    /// Crea un invito per ogni email risolvibile e non ancora in un gruppo.
    /// Ogni invito è una scrittura autonoma, la notifica segue la sua conferma.
    /// Un errore su una singola email la scarta senza toccare gli inviti già creati.
    async fn send_invites(
        &self,
        group: &Group,
        invited_by: i64,
        emails: &[String],
    ) -> InvitationResultDTO {
        let mut result = InvitationResultDTO::default();
        let mut seen = HashSet::new();

        for raw in emails {
            let email = normalize_email(raw);
            if email.is_empty() || !seen.insert(email.clone()) {
                result.skipped.push(raw.clone());
                continue;
            }

            let user = match self.users.find_by_email(&email).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    debug!("No user for invited email");
                    result.skipped.push(raw.clone());
                    continue;
                }
                Err(e) => {
                    error!("Lookup of invited email failed: {}", e);
                    result.skipped.push(raw.clone());
                    continue;
                }
            };

            let invite = match self
                .requests
                .create_invite(&user.id, &group.id, &invited_by)
                .await
            {
                Ok(Some(invite)) => invite,
                Ok(None) => {
                    debug!("User {} already grouped or invited", user.id);
                    result.skipped.push(raw.clone());
                    continue;
                }
                Err(e) => {
                    error!("Invite for user {} failed: {}", user.id, e);
                    result.skipped.push(raw.clone());
                    continue;
                }
            };

            info!("Invite {} created for user {}", invite.id, user.id);
            self.emit(
                user.id,
                NotificationKind::GroupInvite,
                json!({
                    "requestId": invite.id,
                    "groupId": group.id,
                    "groupName": group.name,
                    "invitedBy": invited_by,
                }),
            )
            .await;
            result.invites.push(invite.into());
        }

        result
    }

    /// Applica la decisione, scrive il messaggio informativo per l'altra parte e la notifica
    async fn apply_decision(
        &self,
        caller: &Caller,
        request: GroupRequest,
        decision: RequestStatus,
    ) -> Result<GroupRequest, MembershipError> {
        let group = self.find_group(request.group_id).await?;
        let approved = decision == RequestStatus::Approved;

        // 1. destinatario e testo del messaggio informativo
        let note = match request.kind {
            RequestKind::Invite => request.invited_by.map(|admin_id| CreateMessageDTO {
                sender_id: caller.user_id,
                receiver_id: admin_id,
                group_id: Some(group.id),
                content: format!(
                    "{} {} your invitation to join \"{}\"",
                    caller.email,
                    if approved { "accepted" } else { "declined" },
                    group.name
                ),
            }),
            RequestKind::Join => Some(CreateMessageDTO {
                sender_id: caller.user_id,
                receiver_id: request.user_id,
                group_id: Some(group.id),
                content: format!(
                    "Your request to join \"{}\" was {}",
                    group.name,
                    if approved { "approved" } else { "rejected" }
                ),
            }),
        };

        // 2. compare-and-set in transazione
        let outcome = self
            .requests
            .apply_decision(&request.id, &decision, note.as_ref())
            .await?;

        let (decided, note) = match outcome {
            DecisionOutcome::Applied { request, note } => (request, note),
            DecisionOutcome::AlreadyDecided => {
                warn!("Request {} decided concurrently", request.id);
                return Err(MembershipError::Conflict("Request has already been decided"));
            }
            DecisionOutcome::MemberOfAnotherGroup => {
                warn!("User {} already belongs to another group", request.user_id);
                return Err(MembershipError::Conflict("User already belongs to another group"));
            }
        };

        info!("Request {} set to {}", decided.id, decided.status);

        // 3. notifica dopo il commit
        if let Some(note) = note {
            self.emit(
                note.receiver_id,
                NotificationKind::RequestDecided,
                json!({
                    "requestId": decided.id,
                    "groupId": group.id,
                    "groupName": group.name,
                    "kind": decided.kind,
                    "status": decided.status,
                    "messageId": note.id,
                }),
            )
            .await;
        }

        Ok(decided)
    }

    async fn enrich(
        &self,
        requests: Vec<GroupRequest>,
    ) -> Result<Vec<EnrichedRequestDTO>, MembershipError> {
        let user_ids: Vec<i64> = requests
            .iter()
            .map(|r| r.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let users: HashMap<i64, UserSummaryDTO> = self
            .users
            .read_many(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, UserSummaryDTO::from(u)))
            .collect();

        let mut groups: HashMap<i64, GroupDTO> = HashMap::new();
        for group_id in requests.iter().map(|r| r.group_id) {
            if groups.contains_key(&group_id) {
                continue;
            }
            if let Some(group) = self.groups.read(&group_id).await? {
                groups.insert(group_id, group.into());
            }
        }

        Ok(requests
            .into_iter()
            .map(|r| EnrichedRequestDTO {
                id: r.id,
                kind: r.kind,
                status: r.status,
                created_at: r.created_at,
                invited_by: r.invited_by,
                requester: users.get(&r.user_id).cloned(),
                group: groups.get(&r.group_id).cloned(),
            })
            .collect())
    }

    async fn emit(&self, user_id: i64, kind: NotificationKind, payload: Value) {
        if let Err(e) = self.sink.notify(user_id, kind, payload).await {
            // la mutazione è già confermata, la notifica persa non la annulla
            warn!("Notification {:?} to user {} dropped: {}", kind, user_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::connect_in_memory;
    use crate::dtos::{CreateCommentDTO, CreateEventDTO, CreateExpenseDTO, CreateTaskDTO, CreateUserDTO};
    use crate::repositories::{
        CommentRepository, Create, EventRepository, ExpenseRepository, MessageRepository,
        TaskRepository,
    };
    use crate::workflow::notify::RecordingSink;
    use chrono::Utc;

    struct Harness {
        pool: SqlitePool,
        users: UserRepository,
        requests: GroupRequestRepository,
        sink: Arc<RecordingSink>,
        workflow: MembershipWorkflow,
    }

    async fn harness() -> Harness {
        let pool = connect_in_memory().await.unwrap();
        let sink = Arc::new(RecordingSink::new());
        Harness {
            users: UserRepository::new(pool.clone()),
            requests: GroupRequestRepository::new(pool.clone()),
            workflow: MembershipWorkflow::new(pool.clone(), sink.clone()),
            sink,
            pool,
        }
    }

    impl Harness {
        async fn user(&self, email: &str) -> Caller {
            let user = self
                .users
                .create(&CreateUserDTO {
                    first_name: "Test".into(),
                    last_name: "User".into(),
                    email: email.into(),
                    password: "hash".into(),
                    phone: None,
                    location: None,
                })
                .await
                .unwrap();
            Caller::from(&user)
        }

        async fn group_of(&self, caller: &Caller) -> Option<i64> {
            self.users.read(&caller.user_id).await.unwrap().unwrap().group_id
        }
    }

    #[tokio::test]
    async fn hikers_created_with_invite_and_notification() {
        let h = harness().await;
        let u1 = h.user("u1@x.com").await;
        let u2 = h.user("u2@x.com").await;

        let invites = vec!["u2@x.com".to_string(), "ghost@x.com".to_string()];
        let (group, result) = h.workflow.create_group(&u1, "Hikers", &invites).await.unwrap();

        assert_eq!(group.name, "Hikers");
        assert_eq!(h.group_of(&u1).await, Some(group.id));
        let detail = h.workflow.get_group(group.id).await.unwrap();
        assert_eq!(detail.admins.iter().map(|a| a.id).collect::<Vec<_>>(), vec![u1.user_id]);
        assert_eq!(detail.members.len(), 1);

        assert_eq!(result.invites.len(), 1);
        assert_eq!(result.invites[0].user_id, u2.user_id);
        assert_eq!(result.invites[0].status, RequestStatus::Pending);
        assert_eq!(result.skipped, vec!["ghost@x.com".to_string()]);

        let notified = h.sink.sent_to(u2.user_id, NotificationKind::GroupInvite);
        assert_eq!(notified.len(), 1);
        assert_eq!(notified[0]["groupName"], "Hikers");
        assert_eq!(notified[0]["requestId"], result.invites[0].id);
    }

    #[tokio::test]
    async fn approved_invite_cannot_be_decided_again() {
        let h = harness().await;
        let u1 = h.user("u1@x.com").await;
        let u2 = h.user("u2@x.com").await;
        let (group, result) = h
            .workflow
            .create_group(&u1, "Hikers", &["u2@x.com".to_string()])
            .await
            .unwrap();
        let request_id = result.invites[0].id;

        let decided = h
            .workflow
            .decide_request(&u2, request_id, RequestStatus::Approved)
            .await
            .unwrap();
        assert_eq!(decided.status, RequestStatus::Approved);
        assert_eq!(h.group_of(&u2).await, Some(group.id));

        let again = h
            .workflow
            .decide_request(&u2, request_id, RequestStatus::Rejected)
            .await;
        assert!(matches!(again, Err(MembershipError::Conflict(_))));

        let stored = h.requests.read(&request_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Approved);

        // il creatore dell'invito riceve messaggio e notifica
        let inbox = MessageRepository::new(h.pool.clone())
            .find_inbox(&u1.user_id)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert!(inbox[0].content.contains("accepted"));
        assert_eq!(h.sink.sent_to(u1.user_id, NotificationKind::RequestDecided).len(), 1);
    }

    #[tokio::test]
    async fn already_grouped_invitee_is_skipped() {
        let h = harness().await;
        let u1 = h.user("u1@x.com").await;
        let u3 = h.user("u3@x.com").await;
        h.workflow.create_group(&u3, "Climbers", &[]).await.unwrap();

        let (_, result) = h
            .workflow
            .create_group(&u1, "Hikers", &["U3@x.com ".to_string()])
            .await
            .unwrap();

        assert!(result.invites.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert!(h.requests.find_pending_invites_for_user(&u3.user_id).await.unwrap().is_empty());
        assert!(h.sink.sent_to(u3.user_id, NotificationKind::GroupInvite).is_empty());
    }

    #[tokio::test]
    async fn non_admin_cannot_delete_group() {
        let h = harness().await;
        let u1 = h.user("u1@x.com").await;
        let u4 = h.user("u4@x.com").await;
        let (group, _) = h.workflow.create_group(&u1, "Hikers", &[]).await.unwrap();

        let result = h.workflow.delete_group(&u4, group.id).await;
        assert!(matches!(result, Err(MembershipError::Authorization(_))));

        let detail = h.workflow.get_group(group.id).await.unwrap();
        assert_eq!(detail.members.len(), 1);
    }

    #[tokio::test]
    async fn delete_group_cascades_to_all_children() {
        let h = harness().await;
        let u1 = h.user("u1@x.com").await;
        let u2 = h.user("u2@x.com").await;
        let u5 = h.user("u5@x.com").await;
        let (group, result) = h
            .workflow
            .create_group(&u1, "Hikers", &["u2@x.com".to_string()])
            .await
            .unwrap();
        h.workflow
            .decide_request(&u2, result.invites[0].id, RequestStatus::Approved)
            .await
            .unwrap();
        let pending = h.workflow.request_to_join(&u5, group.id).await.unwrap();

        let events = EventRepository::new(h.pool.clone());
        let tasks = TaskRepository::new(h.pool.clone());
        let event = events
            .create(&CreateEventDTO {
                group_id: group.id,
                host_id: u1.user_id,
                title: "Trail day".into(),
                description: None,
                location: None,
                date: Utc::now(),
            })
            .await
            .unwrap();
        let task = tasks
            .create(&CreateTaskDTO {
                event_id: event.id,
                title: "Bring water".into(),
                created_by: u1.user_id,
                assigned_to: Some(u2.user_id),
            })
            .await
            .unwrap();
        ExpenseRepository::new(h.pool.clone())
            .create(&CreateExpenseDTO {
                event_id: event.id,
                paid_by: u1.user_id,
                amount_cents: 1250,
                description: "Snacks".into(),
                paid: false,
            })
            .await
            .unwrap();
        CommentRepository::new(h.pool.clone())
            .create(&CreateCommentDTO {
                event_id: event.id,
                user_id: u2.user_id,
                content: "See you there".into(),
            })
            .await
            .unwrap();

        h.workflow.delete_group(&u1, group.id).await.unwrap();

        assert!(matches!(
            h.workflow.get_group(group.id).await,
            Err(MembershipError::NotFound(_))
        ));
        assert!(events.read(&event.id).await.unwrap().is_none());
        assert!(tasks.read(&task.id).await.unwrap().is_none());
        assert!(h.requests.read(&pending.id).await.unwrap().is_none());
        assert!(
            MessageRepository::new(h.pool.clone())
                .find_inbox(&u1.user_id)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(h.group_of(&u1).await, None);
        assert_eq!(h.group_of(&u2).await, None);
        assert_eq!(h.sink.sent_to(u2.user_id, NotificationKind::GroupDeleted).len(), 1);
    }

    #[tokio::test]
    async fn join_request_flow_notifies_admins_and_requester() {
        let h = harness().await;
        let admin = h.user("admin@x.com").await;
        let joiner = h.user("joiner@x.com").await;
        let (group, _) = h.workflow.create_group(&admin, "Hikers", &[]).await.unwrap();

        let request = h.workflow.request_to_join(&joiner, group.id).await.unwrap();
        assert_eq!(request.kind, RequestKind::Join);
        assert_eq!(h.sink.sent_to(admin.user_id, NotificationKind::JoinRequest).len(), 1);

        let duplicate = h.workflow.request_to_join(&joiner, group.id).await;
        assert!(matches!(duplicate, Err(MembershipError::Conflict(_))));

        // il richiedente non può approvare la propria richiesta
        let self_approve = h
            .workflow
            .decide_request(&joiner, request.id, RequestStatus::Approved)
            .await;
        assert!(matches!(self_approve, Err(MembershipError::Authorization(_))));

        let pending = h.workflow.list_pending_requests(&admin).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].requester.as_ref().map(|u| u.id), Some(joiner.user_id));
        assert_eq!(pending[0].group.as_ref().map(|g| g.id), Some(group.id));

        h.workflow
            .decide_request(&admin, request.id, RequestStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(h.group_of(&joiner).await, None);
        let decided = h.sink.sent_to(joiner.user_id, NotificationKind::RequestDecided);
        assert_eq!(decided.len(), 1);
        assert_eq!(decided[0]["status"], "REJECTED");

        assert!(matches!(
            h.workflow.list_pending_requests(&admin).await,
            Err(MembershipError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn pending_is_not_a_valid_decision() {
        let h = harness().await;
        let u1 = h.user("u1@x.com").await;
        h.user("u2@x.com").await;
        let (_, result) = h
            .workflow
            .create_group(&u1, "Hikers", &["u2@x.com".to_string()])
            .await
            .unwrap();

        let result = h
            .workflow
            .decide_request(&u1, result.invites[0].id, RequestStatus::Pending)
            .await;
        assert!(matches!(result, Err(MembershipError::Validation(_))));
    }

    #[tokio::test]
    async fn user_never_ends_up_in_two_groups() {
        let h = harness().await;
        let a = h.user("a@x.com").await;
        let b = h.user("b@x.com").await;
        let target = h.user("t@x.com").await;
        let (g1, r1) = h
            .workflow
            .create_group(&a, "One", &["t@x.com".to_string()])
            .await
            .unwrap();
        let (_, r2) = h
            .workflow
            .create_group(&b, "Two", &["t@x.com".to_string()])
            .await
            .unwrap();

        h.workflow
            .decide_invitation(&target, g1.id, RequestStatus::Approved)
            .await
            .unwrap();
        let second = h
            .workflow
            .decide_request(&target, r2.invites[0].id, RequestStatus::Approved)
            .await;
        assert!(matches!(second, Err(MembershipError::Conflict(_))));

        assert_eq!(h.group_of(&target).await, Some(g1.id));
        let stored = h.requests.read(&r1.invites[0].id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Approved);
        let untouched = h.requests.read(&r2.invites[0].id).await.unwrap().unwrap();
        assert_eq!(untouched.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn concurrent_decisions_apply_once() {
        let h = harness().await;
        let admin = h.user("admin@x.com").await;
        let joiner = h.user("joiner@x.com").await;
        let (group, _) = h.workflow.create_group(&admin, "Hikers", &[]).await.unwrap();
        let request = h.workflow.request_to_join(&joiner, group.id).await.unwrap();

        let (first, second) = tokio::join!(
            h.workflow.decide_request(&admin, request.id, RequestStatus::Approved),
            h.workflow.decide_request(&admin, request.id, RequestStatus::Rejected),
        );

        let applied = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(applied, 1);
        assert!(
            [first, second]
                .into_iter()
                .any(|r| matches!(r, Err(MembershipError::Conflict(_))))
        );
    }

    #[tokio::test]
    async fn create_group_conflicts() {
        let h = harness().await;
        let u1 = h.user("u1@x.com").await;
        let u2 = h.user("u2@x.com").await;
        h.workflow.create_group(&u1, "Hikers", &[]).await.unwrap();

        let again = h.workflow.create_group(&u1, "Other", &[]).await;
        assert_eq!(again.unwrap_err(), MembershipError::Conflict("You already belong to a group"));

        let taken = h.workflow.create_group(&u2, "Hikers", &[]).await;
        assert_eq!(taken.unwrap_err(), MembershipError::Conflict("Group name already taken"));
        assert_eq!(h.group_of(&u2).await, None);

        let blank = h.workflow.create_group(&u2, "   ", &[]).await;
        assert!(matches!(blank, Err(MembershipError::Validation(_))));
    }

    #[tokio::test]
    async fn leave_rules_for_admins_and_last_member() {
        let h = harness().await;
        let admin = h.user("admin@x.com").await;
        let member = h.user("member@x.com").await;
        let outsider = h.user("out@x.com").await;
        let (group, _) = h
            .workflow
            .create_group(&admin, "Hikers", &["member@x.com".to_string()])
            .await
            .unwrap();
        h.workflow
            .decide_invitation(&member, group.id, RequestStatus::Approved)
            .await
            .unwrap();

        let not_member = h.workflow.leave_group(&outsider, group.id).await;
        assert!(matches!(not_member, Err(MembershipError::Authorization(_))));

        let last_admin = h.workflow.leave_group(&admin, group.id).await;
        assert!(matches!(last_admin, Err(MembershipError::Conflict(_))));

        h.workflow.promote_admin(&admin, group.id, member.user_id).await.unwrap();
        let twice = h.workflow.promote_admin(&admin, group.id, member.user_id).await;
        assert!(matches!(twice, Err(MembershipError::Conflict(_))));

        let left = h.workflow.leave_group(&admin, group.id).await.unwrap();
        assert!(!left.group_deleted);
        assert_eq!(h.group_of(&admin).await, None);

        let detail = h.workflow.get_group(group.id).await.unwrap();
        assert_eq!(detail.admins.iter().map(|a| a.id).collect::<Vec<_>>(), vec![member.user_id]);

        let last = h.workflow.leave_group(&member, group.id).await.unwrap();
        assert!(last.group_deleted);
        assert!(matches!(
            h.workflow.get_group(group.id).await,
            Err(MembershipError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_admins_invite_and_promote() {
        let h = harness().await;
        let admin = h.user("admin@x.com").await;
        let other = h.user("other@x.com").await;
        h.user("guest@x.com").await;
        let (group, _) = h.workflow.create_group(&admin, "Hikers", &[]).await.unwrap();

        let invite = h
            .workflow
            .invite_members(&other, group.id, &["guest@x.com".to_string()])
            .await;
        assert!(matches!(invite, Err(MembershipError::Authorization(_))));

        let missing = h.workflow.invite_members(&admin, 999, &[]).await;
        assert!(matches!(missing, Err(MembershipError::NotFound(_))));

        let promote_outsider = h.workflow.promote_admin(&admin, group.id, other.user_id).await;
        assert!(matches!(promote_outsider, Err(MembershipError::NotFound(_))));

        let result = h
            .workflow
            .invite_members(
                &admin,
                group.id,
                &["guest@x.com".to_string(), "GUEST@x.com".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(result.invites.len(), 1);
        assert_eq!(result.skipped, vec!["GUEST@x.com".to_string()]);
    }

    #[tokio::test]
    async fn invitations_are_listed_for_the_invitee() {
        let h = harness().await;
        let admin = h.user("admin@x.com").await;
        let guest = h.user("guest@x.com").await;
        let (group, _) = h
            .workflow
            .create_group(&admin, "Hikers", &["guest@x.com".to_string()])
            .await
            .unwrap();

        let mine = h.workflow.list_my_invitations(&guest).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].kind, RequestKind::Invite);
        assert_eq!(mine[0].invited_by, Some(admin.user_id));
        assert_eq!(mine[0].group.as_ref().map(|g| g.name.as_str()), Some("Hikers"));

        let none = h.workflow.decide_invitation(&admin, group.id, RequestStatus::Approved).await;
        assert!(matches!(none, Err(MembershipError::NotFound(_))));
    }

    #[tokio::test]
    async fn rename_is_reserved_to_admins() {
        let h = harness().await;
        let admin = h.user("admin@x.com").await;
        let other = h.user("other@x.com").await;
        let (group, _) = h.workflow.create_group(&admin, "Hikers", &[]).await.unwrap();
        h.workflow.create_group(&other, "Climbers", &[]).await.unwrap();

        let renamed = h.workflow.rename_group(&admin, group.id, "  Trekkers ").await.unwrap();
        assert_eq!(renamed.name, "Trekkers");
        assert_eq!(renamed.created_at, group.created_at);

        let forbidden = h.workflow.rename_group(&other, group.id, "Mine").await;
        assert!(matches!(forbidden, Err(MembershipError::Authorization(_))));

        let taken = h.workflow.rename_group(&admin, group.id, "Climbers").await;
        assert_eq!(taken.unwrap_err(), MembershipError::Conflict("Group name already taken"));

        let blank = h.workflow.rename_group(&admin, group.id, " ").await;
        assert!(matches!(blank, Err(MembershipError::Validation(_))));

        let missing = h.workflow.rename_group(&admin, 999, "Ghost").await;
        assert!(matches!(missing, Err(MembershipError::NotFound(_))));
    }

    #[tokio::test]
    async fn join_request_survives_failed_admin_lookup() {
        let h = harness().await;
        let admin = h.user("admin@x.com").await;
        let joiner = h.user("joiner@x.com").await;
        let (group, _) = h.workflow.create_group(&admin, "Hikers", &[]).await.unwrap();

        // la lettura degli admin fallisce dopo che la richiesta è stata scritta
        sqlx::query("DROP TABLE group_admins").execute(&h.pool).await.unwrap();

        let request = h.workflow.request_to_join(&joiner, group.id).await.unwrap();
        assert_eq!(request.kind, RequestKind::Join);
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(h.sink.sent().is_empty());
        assert!(h.requests.read(&request.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failing_invite_is_skipped_not_fatal() {
        let h = harness().await;
        let admin = h.user("admin@x.com").await;
        h.user("guest@x.com").await;
        let (group, _) = h.workflow.create_group(&admin, "Hikers", &[]).await.unwrap();

        sqlx::query("DROP TABLE group_requests").execute(&h.pool).await.unwrap();

        let result = h
            .workflow
            .invite_members(&admin, group.id, &["guest@x.com".to_string()])
            .await
            .unwrap();
        assert!(result.invites.is_empty());
        assert_eq!(result.skipped, vec!["guest@x.com".to_string()]);
        assert!(h.sink.sent().is_empty());
    }
}
