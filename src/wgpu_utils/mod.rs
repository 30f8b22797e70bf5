pub mod uniform_buffer;
