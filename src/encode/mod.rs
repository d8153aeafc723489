pub mod encoder;
pub mod ffmpeg;
pub mod job;

#[cfg(test)]
pub mod testing;
