pub mod manual_clock_source;
