pub mod person_sequence;
