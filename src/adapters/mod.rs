//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements         | Connects to                   |
//! |--------------|--------------------|-------------------------------|
//! | `linux`      | SensorPort         | IIO ADCs, i2c-dev, sysfs GPIO |
//! |              | ActuatorPort       | sysfs GPIO                    |
//! | `sim`        | SensorPort         | scripted burner profiles      |
//! |              | ActuatorPort       | in-memory output table        |
//! | `datafile`   | RecordStore        | CSV files on the data volume  |
//! | `log_sink`   | EventSink          | `log` facade / env_logger     |
//! | `time`       | ClockPort          | chrono UTC, simulated seconds |
//! | `radio_link` | (sample queue)     | XBee coordinator serial port  |

pub mod datafile;
pub mod linux;
pub mod log_sink;
pub mod radio_link;
pub mod sim;
pub mod time;
