//! Line-editing buffer for the console prompt.


/// Input buffer for the command line.
#[derive( Debug, Default )]
pub struct InputBuffer {
    content: String,
    cursor: usize,
}


impl InputBuffer {
    /// Creates a new empty input buffer.
    pub fn new() -> Self {
        Self::default()
    }


    /// Inserts a character at the cursor position.
    pub fn insert( &mut self, c: char ) {
        self.content.insert( self.cursor, c );
        self.cursor += c.len_utf8();
    }


    /// Deletes the character before the cursor.
    pub fn backspace( &mut self ) {
        if let Some(( prev, _ )) = self.content[ ..self.cursor ].char_indices().last() {
            self.content.remove( prev );
            self.cursor = prev;
        }
    }


    /// Deletes the character under the cursor.
    pub fn delete( &mut self ) {
        if self.cursor < self.content.len() {
            self.content.remove( self.cursor );
        }
    }


    pub fn move_left( &mut self ) {
        self.cursor = self.content[ ..self.cursor ]
            .char_indices()
            .last()
            .map( |( i, _ )| i )
            .unwrap_or( 0 );
    }


    pub fn move_right( &mut self ) {
        if let Some( c ) = self.content[ self.cursor.. ].chars().next() {
            self.cursor += c.len_utf8();
        }
    }


    pub fn move_home( &mut self ) {
        self.cursor = 0;
    }


    pub fn move_end( &mut self ) {
        self.cursor = self.content.len();
    }


    /// Clears the buffer.
    pub fn clear( &mut self ) {
        self.content.clear();
        self.cursor = 0;
    }


    /// Takes the content out, leaving the buffer empty.
    pub fn take( &mut self ) -> String {
        self.cursor = 0;
        std::mem::take( &mut self.content )
    }


    pub fn content( &self ) -> &str {
        &self.content
    }


    /// Cursor position as a character count, for display.
    pub fn cursor_char_pos( &self ) -> usize {
        self.content[ ..self.cursor ].chars().count()
    }


    pub fn is_empty( &self ) -> bool {
        self.content.is_empty()
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    fn typed( text: &str ) -> InputBuffer {
        let mut buffer = InputBuffer::new();
        text.chars().for_each( |c| buffer.insert( c ) );
        buffer
    }


    #[test]
    fn test_edit_in_middle() {
        let mut buffer = typed( "thme" );
        buffer.move_home();
        buffer.move_right();
        buffer.insert( 'e' );
        assert_eq!( buffer.content(), "theme" );
        assert_eq!( buffer.cursor_char_pos(), 2 );
    }


    #[test]
    fn test_multibyte_backspace() {
        let mut buffer = typed( "café" );
        buffer.backspace();
        assert_eq!( buffer.content(), "caf" );
        buffer.move_left();
        buffer.delete();
        assert_eq!( buffer.content(), "ca" );
    }


    #[test]
    fn test_take_resets() {
        let mut buffer = typed( "help" );
        assert_eq!( buffer.take(), "help" );
        assert!( buffer.is_empty() );
        assert_eq!( buffer.cursor_char_pos(), 0 );
    }
}
