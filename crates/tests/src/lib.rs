pub mod fixtures;

#[cfg(test)]
mod srt_tests;
#[cfg(test)]
mod translation_tests;
#[cfg(test)]
mod vocabulary_tests;
