//! GATT profile of the impersonated peripheral.
//!
//! | Service            | UUID   | Characteristic     | UUID   | Props            | Value              |
//! |--------------------|--------|--------------------|--------|------------------|--------------------|
//! | Heart Rate         | 0x180D | HR Measurement     | 0x2A37 | Notify+ReadEnc   | 2 bytes, rolling   |
//! | Device Information | 0x180A | Manufacturer Name  | 0x2A29 | ReadEnc          | config manufacturer|
//! |                    |        | Model Number       | 0x2A24 | ReadEnc          | BLE name           |
//! | Battery            | 0x180F | Battery Level      | 0x2A19 | Read+Notify      | config level (100) |
//!
//! The encrypted-read properties are what makes iOS and Android start
//! pairing as soon as a central touches the heart-rate characteristic.

pub const HEART_RATE_SERVICE: u16 = 0x180D;
pub const HEART_RATE_MEASUREMENT: u16 = 0x2A37;
pub const DEVICE_INFO_SERVICE: u16 = 0x180A;
pub const MANUFACTURER_NAME: u16 = 0x2A29;
pub const MODEL_NUMBER: u16 = 0x2A24;
pub const BATTERY_SERVICE: u16 = 0x180F;
pub const BATTERY_LEVEL: u16 = 0x2A19;

/// Characteristic property bits, independent of the host stack's flag type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Props(u8);

impl Props {
    pub const READ: Self = Self(0x01);
    pub const READ_ENC: Self = Self(0x02);
    pub const NOTIFY: Self = Self(0x04);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Where a characteristic's initial value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialValue {
    /// Two zero bytes, overwritten by every notification.
    HeartRate,
    Manufacturer,
    BleName,
    BatteryLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicSpec {
    pub uuid: u16,
    pub props: Props,
    pub value: InitialValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSpec {
    pub uuid: u16,
    pub characteristics: &'static [CharacteristicSpec],
}

pub const PROFILE: &[ServiceSpec] = &[
    ServiceSpec {
        uuid: HEART_RATE_SERVICE,
        characteristics: &[CharacteristicSpec {
            uuid: HEART_RATE_MEASUREMENT,
            props: Props::NOTIFY.union(Props::READ_ENC),
            value: InitialValue::HeartRate,
        }],
    },
    ServiceSpec {
        uuid: DEVICE_INFO_SERVICE,
        characteristics: &[
            CharacteristicSpec {
                uuid: MANUFACTURER_NAME,
                props: Props::READ_ENC,
                value: InitialValue::Manufacturer,
            },
            CharacteristicSpec {
                uuid: MODEL_NUMBER,
                props: Props::READ_ENC,
                value: InitialValue::BleName,
            },
        ],
    },
    ServiceSpec {
        uuid: BATTERY_SERVICE,
        characteristics: &[CharacteristicSpec {
            uuid: BATTERY_LEVEL,
            props: Props::READ.union(Props::NOTIFY),
            value: InitialValue::BatteryLevel,
        }],
    },
];

/// Heart-rate measurement: the configured flags byte followed by a byte
/// that varies between notifications.
pub fn heart_rate_payload(flags: u8, now_us: u64) -> [u8; 2] {
    [flags, (now_us & 0xFF) as u8]
}
