pub mod tdengine;
