//! Decoding of event logs against known event decorators

use alloy::{
    dyn_abi::{DynSolEvent, DynSolType},
    hex,
    primitives::{Log, keccak256},
};
use serde_json::Value;
use tracing::warn;

use crate::{
    abi::{
        error::AbiError,
        shaping::{parameter_type, shape_value},
    },
    types::{
        decorator::ContractEvent,
        transaction::{EventArgument, EventInfo},
    },
};

/// The width of a single ABI word
const WORD_LEN: usize = 32;
/// The type reported for undecoded log words
const WORD_TYPE: &str = "bytes32";

/// Decode a list of logs, falling back to raw words for logs which match no
/// known event
pub fn decode_logs(logs: &[Log], events: &[ContractEvent]) -> Vec<EventInfo> {
    logs.iter().map(|log| decode_log(log, events)).collect()
}

/// Decode a single log
fn decode_log(log: &Log, events: &[ContractEvent]) -> EventInfo {
    let Some(event) = matching_event(log, events) else {
        return decode_as_words(log);
    };

    match decode_known_event(log, event) {
        Ok(info) => info,
        Err(e) => {
            warn!("Failed to decode event {}: {e}", event.signature);
            decode_as_words(log)
        },
    }
}

/// Find the event a log was emitted for: by topic 0, else the only anonymous
/// candidate whose indexed inputs fill the log's topics
fn matching_event<'a>(log: &Log, events: &'a [ContractEvent]) -> Option<&'a ContractEvent> {
    let topics = log.data.topics();
    if let Some(topic0) = topics.first()
        && let Some(event) = events.iter().find(|e| keccak256(e.signature.as_bytes()) == *topic0)
    {
        return Some(event);
    }

    let mut candidates = events
        .iter()
        .filter(|e| e.inputs.iter().filter(|input| input.indexed).count() == topics.len());

    match (candidates.next(), candidates.next()) {
        (Some(event), None) => Some(event),
        _ => None,
    }
}

/// Decode a log as an instance of the given event
fn decode_known_event(log: &Log, event: &ContractEvent) -> Result<EventInfo, AbiError> {
    let mut indexed_types = vec![];
    let mut body_types = vec![];
    for input in &event.inputs {
        let ty = parameter_type(&input.parameter)?;
        if input.indexed {
            indexed_types.push(ty);
        } else {
            body_types.push(ty);
        }
    }

    let topics = log.data.topics();
    let topic0 = keccak256(event.signature.as_bytes());
    let anonymous = topics.first() != Some(&topic0);

    let dyn_event = DynSolEvent::new_unchecked(
        (!anonymous).then_some(topic0),
        indexed_types,
        DynSolType::Tuple(body_types),
    );
    let decoded = dyn_event
        .decode_log_parts(topics.iter().copied(), &log.data.data)
        .map_err(AbiError::decoding)?;

    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();

    let arguments = event
        .inputs
        .iter()
        .map(|input| {
            let value = if input.indexed { indexed.next() } else { body.next() };
            let value = value.ok_or_else(|| AbiError::decoding("missing event argument"))?;

            Ok(EventArgument {
                name: input.parameter.solidity_name.clone(),
                ty: input.parameter.solidity_type.clone(),
                value: shape_value(&input.parameter, value),
            })
        })
        .collect::<Result<_, AbiError>>()?;

    Ok(EventInfo {
        contract_address: log.address,
        signature: Some(event.signature.clone()),
        arguments,
    })
}

/// Report a log as raw 32-byte words: data words first, then topics
fn decode_as_words(log: &Log) -> EventInfo {
    let data_words = log.data.data.chunks(WORD_LEN).map(hex::encode_prefixed);
    let topic_words = log.data.topics().iter().map(hex::encode_prefixed);

    let arguments = data_words
        .chain(topic_words)
        .enumerate()
        .map(|(i, word)| EventArgument {
            name: format!("arg{i}"),
            ty: WORD_TYPE.to_string(),
            value: Value::String(word),
        })
        .collect();

    EventInfo { contract_address: log.address, signature: None, arguments }
}
