pub mod aranjuez;
