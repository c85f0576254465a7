//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod event;
pub mod group;
pub mod group_request;
pub mod message;
pub mod query;
pub mod user;

pub use event::{
    CreateCommentDTO, CreateCommentRequestDTO, CreateEventDTO, CreateEventRequestDTO,
    CreateExpenseDTO, CreateExpenseRequestDTO, CreateTaskDTO, CreateTaskRequestDTO,
    UpdateEventDTO, UpdateExpenseDTO, UpdateTaskDTO, UpdateTaskRequestDTO, UpdateTaskStatusDTO,
};
pub use group::{
    CreateGroupDTO, DecisionDTO, GroupCreatedDTO, GroupDTO, GroupDetailDTO, InvitationResultDTO,
    InviteMembersDTO, JoinRequestDTO, LeaveGroupDTO, RenameGroupDTO,
};
pub use group_request::{EnrichedRequestDTO, GroupRequestDTO};
pub use message::{CreateMessageDTO, SendMessageDTO};
pub use query::UserSearchQuery;
pub use user::{
    AuthResponseDTO, CreateUserDTO, LoginDTO, UpdateUserDTO, UserDTO, UserSummaryDTO,
};
