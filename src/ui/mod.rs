mod output;

pub use output::{
    display_message, display_session, display_session_list, display_streaming_update,
    print_chat_help, print_welcome_banner,
};
