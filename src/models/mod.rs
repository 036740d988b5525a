pub mod influx;
pub mod opentsdb;
