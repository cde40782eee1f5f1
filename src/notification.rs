//! Bucket notifications as delivered by S3 and S3-compatible stores.
//!
//! Only the fields the relay needs are decoded. A document without `Records`, like the
//! `s3:TestEvent` S3 sends when a notification target is first configured, decodes to an empty
//! batch.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct S3Object {
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// One reported object creation. Keys are used exactly as delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeNotification {
    pub bucket: String,
    pub key: String,
}

impl ChangeNotification {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl From<S3EventRecord> for ChangeNotification {
    fn from(record: S3EventRecord) -> Self {
        Self {
            bucket: record.s3.bucket.name,
            key: record.s3.object.key,
        }
    }
}

impl S3Event {
    /// The records of this event as notifications, in delivery order.
    pub fn into_notifications(self) -> Vec<ChangeNotification> {
        self.records.into_iter().map(Into::into).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUT_EVENT: &str = r#"{
        "Records": [
            {
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "eu-west-1",
                "eventTime": "2023-10-12T08:15:30.000Z",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "configurationId": "compress-incoming",
                    "bucket": {
                        "name": "uploads",
                        "arn": "arn:aws:s3:::uploads"
                    },
                    "object": {
                        "key": "incoming/report.csv",
                        "size": 1024,
                        "eTag": "0123456789abcdef0123456789abcdef",
                        "sequencer": "0A1B2C3D4E5F678901"
                    }
                }
            },
            {
                "eventName": "ObjectCreated:CompleteMultipartUpload",
                "s3": {
                    "bucket": { "name": "uploads" },
                    "object": { "key": "incoming/large.bin" }
                }
            }
        ]
    }"#;

    #[test]
    fn decode_put_event_test() {
        let event: S3Event = serde_json::from_str(PUT_EVENT).unwrap();
        assert_eq!(event.records.len(), 2);
        assert_eq!(
            event.records[0].event_name.as_deref(),
            Some("ObjectCreated:Put")
        );
        assert_eq!(event.records[0].s3.object.size, Some(1024));
        assert_eq!(event.records[1].s3.object.size, None);

        let notifications = event.into_notifications();
        assert_eq!(
            notifications,
            vec![
                ChangeNotification::new("uploads", "incoming/report.csv"),
                ChangeNotification::new("uploads", "incoming/large.bin"),
            ]
        );
    }

    #[test]
    fn decode_test_event_test() {
        let test_event = r#"{
            "Service": "Amazon S3",
            "Event": "s3:TestEvent",
            "Time": "2023-10-12T08:15:30.000Z",
            "Bucket": "uploads",
            "RequestId": "5582815E1AEA5ADF",
            "HostId": "8cLeGAmw098X5cv4Zkwcmo8vvZa3eH3eKxsPzbB9wrR+YstdA6Knx4Ip8EXAMPLE"
        }"#;
        let event: S3Event = serde_json::from_str(test_event).unwrap();
        assert!(event.into_notifications().is_empty());
    }

    #[test]
    fn decode_record_without_key_fails_test() {
        let broken = r#"{ "Records": [ { "s3": { "bucket": { "name": "uploads" }, "object": {} } } ] }"#;
        assert!(serde_json::from_str::<S3Event>(broken).is_err());
    }
}
