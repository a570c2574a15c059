mod template_tests;
mod text_tests;
