//! Static message-ID dispatch table for extracting `target_system`/`target_component`.
//!
//! The protocol has no reflection: a message's "does it address a specific
//! system/component" question can't be answered generically at runtime. Instead this module
//! keeps one small extractor function per message that carries target fields, keyed by
//! [`MessageId`] in a table built once and reused for the life of the process. Unlisted
//! message IDs are treated as untargeted (broadcast).
//!
//! The table below covers the messages a router is most likely to see addressed to a single
//! peer (commands, parameter and mission protocols, log transfer, setpoints). It is not an
//! exhaustive listing of every targeted message in the `common` dialect; extend it by adding
//! another `insert` line and an extractor function when a new one matters.

use std::collections::HashMap;
use std::sync::OnceLock;

use mavio::dialects::common::messages::{
    CommandInt, CommandLong, FileTransferProtocol, LogErase, LogRequestData,
    LogRequestEnd, LogRequestList, MissionClearAll, MissionCount, MissionItemInt,
    MissionRequestInt, MissionRequestList, MissionSetCurrent, ParamExtRequestList,
    ParamExtRequestRead, ParamExtSet, ParamRequestList, ParamRequestRead, ParamSet, Ping,
    RequestDataStream, SetAttitudeTarget, SetMode, SetPositionTargetGlobalInt,
    SetPositionTargetLocalNed,
};
use mavio::mavspec::rust::spec::MessageSpecStatic;

use super::{ComponentId, MessageId, Payload, SystemId};

type Extractor = fn(&Payload) -> Option<(SystemId, ComponentId)>;

fn extract<M>(payload: &Payload) -> Option<(SystemId, ComponentId)>
where
    M: for<'a> TryFrom<&'a Payload> + HasTarget,
{
    M::try_from(payload).ok().map(|m| m.target())
}

/// A decoded message that carries `target_system`/`target_component` fields.
trait HasTarget {
    fn target(&self) -> (SystemId, ComponentId);
}

macro_rules! has_target {
    ($ty:ty) => {
        impl HasTarget for $ty {
            fn target(&self) -> (SystemId, ComponentId) {
                (self.target_system, self.target_component)
            }
        }
    };
}

has_target!(RequestDataStream);
has_target!(CommandLong);
has_target!(CommandInt);
has_target!(ParamRequestRead);
has_target!(ParamRequestList);
has_target!(ParamSet);
has_target!(ParamExtRequestRead);
has_target!(ParamExtRequestList);
has_target!(ParamExtSet);
has_target!(MissionRequestList);
has_target!(MissionRequestInt);
has_target!(MissionSetCurrent);
has_target!(MissionCount);
has_target!(MissionClearAll);
has_target!(MissionItemInt);
has_target!(SetMode);
has_target!(Ping);
has_target!(FileTransferProtocol);
has_target!(LogRequestList);
has_target!(LogRequestData);
has_target!(LogErase);
has_target!(LogRequestEnd);
has_target!(SetPositionTargetLocalNed);
has_target!(SetPositionTargetGlobalInt);
has_target!(SetAttitudeTarget);

fn table() -> &'static HashMap<MessageId, Extractor> {
    static TABLE: OnceLock<HashMap<MessageId, Extractor>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table: HashMap<MessageId, Extractor> = HashMap::new();
        table.insert(RequestDataStream::message_id(), extract::<RequestDataStream>);
        table.insert(CommandLong::message_id(), extract::<CommandLong>);
        table.insert(CommandInt::message_id(), extract::<CommandInt>);
        table.insert(ParamRequestRead::message_id(), extract::<ParamRequestRead>);
        table.insert(ParamRequestList::message_id(), extract::<ParamRequestList>);
        table.insert(ParamSet::message_id(), extract::<ParamSet>);
        table.insert(ParamExtRequestRead::message_id(), extract::<ParamExtRequestRead>);
        table.insert(
            ParamExtRequestList::message_id(),
            extract::<ParamExtRequestList>,
        );
        table.insert(ParamExtSet::message_id(), extract::<ParamExtSet>);
        table.insert(
            MissionRequestList::message_id(),
            extract::<MissionRequestList>,
        );
        table.insert(
            MissionRequestInt::message_id(),
            extract::<MissionRequestInt>,
        );
        table.insert(MissionSetCurrent::message_id(), extract::<MissionSetCurrent>);
        table.insert(MissionCount::message_id(), extract::<MissionCount>);
        table.insert(MissionClearAll::message_id(), extract::<MissionClearAll>);
        table.insert(MissionItemInt::message_id(), extract::<MissionItemInt>);
        table.insert(SetMode::message_id(), extract::<SetMode>);
        table.insert(Ping::message_id(), extract::<Ping>);
        table.insert(
            FileTransferProtocol::message_id(),
            extract::<FileTransferProtocol>,
        );
        table.insert(LogRequestList::message_id(), extract::<LogRequestList>);
        table.insert(LogRequestData::message_id(), extract::<LogRequestData>);
        table.insert(LogErase::message_id(), extract::<LogErase>);
        table.insert(LogRequestEnd::message_id(), extract::<LogRequestEnd>);
        table.insert(
            SetPositionTargetLocalNed::message_id(),
            extract::<SetPositionTargetLocalNed>,
        );
        table.insert(
            SetPositionTargetGlobalInt::message_id(),
            extract::<SetPositionTargetGlobalInt>,
        );
        table.insert(SetAttitudeTarget::message_id(), extract::<SetAttitudeTarget>);
        table
    })
}

/// Returns the `(target_system, target_component)` pair for a message, if that message ID is
/// known to carry one.
///
/// `target_system == 0` conventionally means "any system" and is still returned as-is; callers
/// decide how to interpret it.
pub fn target_of(message_id: MessageId, payload: &Payload) -> Option<(SystemId, ComponentId)> {
    table().get(&message_id).and_then(|extractor| extractor(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_targeted_messages_are_registered() {
        assert!(table().contains_key(&RequestDataStream::message_id()));
        assert!(table().contains_key(&CommandLong::message_id()));
        assert!(table().contains_key(&MissionItemInt::message_id()));
    }

    #[test]
    fn heartbeat_is_not_a_targeted_message() {
        use mavio::dialects::common::messages::Heartbeat;
        assert!(!table().contains_key(&Heartbeat::message_id()));
    }
}
