use crate::errors::MessageIdError;

use std::fmt;
use std::str::FromStr;

/// Identifier handed out by a broker when it stores a message.
///
/// The textual form is `<broker_name>:<position>` with the position written
/// as 16 lowercase hex digits. Broker names may themselves contain `:`, so the
/// last separator wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId {
    pub broker_name: String,
    pub position: u64,
}

impl MessageId {
    pub fn new(broker_name: impl Into<String>, position: u64) -> Self {
        MessageId {
            broker_name: broker_name.into(),
            position,
        }
    }

    pub fn parse(id: &str) -> Result<Self, MessageIdError> {
        let (broker, position) = id
            .rsplit_once(':')
            .ok_or_else(|| MessageIdError::MissingSeparator(id.to_string()))?;
        if broker.is_empty() {
            return Err(MessageIdError::EmptyBroker(id.to_string()));
        }
        if position.len() != 16 {
            return Err(MessageIdError::InvalidPosition(id.to_string()));
        }
        let position = u64::from_str_radix(position, 16)
            .map_err(|_| MessageIdError::InvalidPosition(id.to_string()))?;
        Ok(MessageId::new(broker, position))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:016x}", self.broker_name, self.position)
    }
}

impl FromStr for MessageId {
    type Err = MessageIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageId::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_name_may_contain_separator() {
        let id = MessageId::parse("zone-a:broker-1:00000000000004d2").unwrap();
        assert_eq!(id.broker_name, "zone-a:broker-1");
        assert_eq!(id.position, 1234);
        assert_eq!(id.to_string(), "zone-a:broker-1:00000000000004d2");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(matches!(
            MessageId::parse("0000000000000001"),
            Err(MessageIdError::MissingSeparator(_))
        ));
        assert!(matches!(
            MessageId::parse(":0000000000000001"),
            Err(MessageIdError::EmptyBroker(_))
        ));
        assert!(matches!(
            MessageId::parse("broker-1:zz"),
            Err(MessageIdError::InvalidPosition(_))
        ));
    }
}
