pub mod backup;
pub mod checker;
pub mod comment_lexer;
pub mod commented_code;
pub mod config;
pub mod discovery;
pub mod highlight;
pub mod ignore_list;
pub mod parser;
pub mod pipeline;
pub mod source_file;
pub mod speller;
pub mod style;
pub mod terminal;
pub mod text_buffer;
pub mod types;
pub mod words;
