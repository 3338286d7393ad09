//! Request/response envelopes and the operation codes understood by the
//! directory servers and the broker admin endpoints.

/// Outcome reported by the remote side for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    Failed,
}

impl ResponseStatus {
    pub fn as_i16(self) -> i16 {
        match self {
            ResponseStatus::Success => 1,
            ResponseStatus::Failed => 2,
        }
    }

    // anything the peer sends other than success is treated as a failure
    pub fn from_i16(value: i16) -> Self {
        match value {
            1 => ResponseStatus::Success,
            _ => ResponseStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotingRequest {
    pub code: i32,
    pub body: Vec<u8>,
}

impl RemotingRequest {
    pub fn new(code: impl Into<i32>, body: Vec<u8>) -> Self {
        RemotingRequest {
            code: code.into(),
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotingResponse {
    pub status: ResponseStatus,
    pub body: Vec<u8>,
}

impl RemotingResponse {
    pub fn success(body: Vec<u8>) -> Self {
        RemotingResponse {
            status: ResponseStatus::Success,
            body,
        }
    }

    pub fn failed(message: impl AsRef<str>) -> Self {
        RemotingResponse {
            status: ResponseStatus::Failed,
            body: message.as_ref().as_bytes().to_vec(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// Operations served by the directory servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum NameServerRequestCode {
    GetAllClusters = 10000,
    GetClusterBrokers = 10001,
    GetClusterBrokerStatusInfoList = 10002,
    GetTopicQueueInfo = 10003,
    GetTopicConsumeInfo = 10004,
    GetProducerList = 10005,
    GetConsumerList = 10006,
    CreateTopic = 10007,
    DeleteTopic = 10008,
    AddQueue = 10009,
    DeleteQueue = 10010,
    SetQueueProducerVisible = 10011,
    SetQueueConsumerVisible = 10012,
    SetQueueNextConsumeOffset = 10013,
    DeleteConsumerGroup = 10014,
    GetTopicAccumulateInfoList = 10015,
}

impl From<NameServerRequestCode> for i32 {
    fn from(code: NameServerRequestCode) -> Self {
        code as i32
    }
}

/// Operations served by the admin endpoint of a broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum BrokerRequestCode {
    GetBrokerStatisticInfo = 100,
    GetTopicQueueInfo = 101,
    GetTopicConsumeInfo = 102,
    GetProducerList = 103,
    GetConsumerList = 104,
    GetLatestMessages = 105,
    CreateTopic = 106,
    DeleteTopic = 107,
    AddQueue = 108,
    DeleteQueue = 109,
    SetQueueProducerVisible = 110,
    SetQueueConsumerVisible = 111,
    SetQueueNextConsumeOffset = 112,
    DeleteConsumerGroup = 113,
    GetMessageDetail = 114,
    GetMessageDetailByQueueOffset = 115,
}

impl From<BrokerRequestCode> for i32 {
    fn from(code: BrokerRequestCode) -> Self {
        code as i32
    }
}
