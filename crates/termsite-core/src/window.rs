//! Overlay window geometry.
//!
//! Coordinates are terminal cells relative to the containing area.
//! The window always stays fully inside its bounds.


/// Top-left corner of the window.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct Position {
    pub x: i32,
    pub y: i32,
}


/// Width and height in cells.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct Size {
    pub width: i32,
    pub height: i32,
}


impl Size {
    pub const fn new( width: i32, height: i32 ) -> Self {
        Self { width, height }
    }
}


/// Size of the window when open.
pub const NORMAL_SIZE: Size = Size::new( 72, 20 );

/// Size of the window when minimized to its title bar.
pub const MINIMIZED_SIZE: Size = Size::new( 32, 3 );


/// Snapshot of the window geometry.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct GeometryState {
    pub position: Position,
    pub size: Size,
    pub minimized: bool,
    pub visible: bool,
}


/// Owns window position, size, minimized flag and visibility.
#[derive( Debug )]
pub struct WindowController {
    state: GeometryState,
    bounds: Size,
}


impl WindowController {
    /// Creates a visible, normal-sized window centered in `bounds`.
    pub fn new( bounds: Size ) -> Self {
        let position = Position {
            x: ( bounds.width - NORMAL_SIZE.width ) / 2,
            y: ( bounds.height - NORMAL_SIZE.height ) / 2,
        };

        let mut window = Self {
            state: GeometryState {
                position,
                size: NORMAL_SIZE,
                minimized: false,
                visible: true,
            },
            bounds,
        };
        window.clamp();
        window
    }


    /// Flips the minimized flag and swaps between the size presets.
    pub fn toggle_minimize( &mut self ) {
        self.state.minimized = !self.state.minimized;
        self.state.size = if self.state.minimized { MINIMIZED_SIZE } else { NORMAL_SIZE };
        // Restoring to the larger preset may push the far edge out of bounds.
        self.clamp();
    }


    /// Moves the window, clamping it inside the bounds.
    pub fn drag( &mut self, position: Position ) {
        self.state.position = position;
        self.clamp();
    }


    /// Moves the window by a relative offset.
    pub fn drag_by( &mut self, dx: i32, dy: i32 ) {
        let Position { x, y } = self.state.position;
        self.drag( Position { x: x.saturating_add( dx ), y: y.saturating_add( dy ) } );
    }


    /// Hides the window. All other state is kept.
    pub fn close( &mut self ) {
        self.state.visible = false;
    }


    /// Shows the window again.
    pub fn open( &mut self ) {
        self.state.visible = true;
    }


    /// Updates the containing bounds and re-clamps the position.
    pub fn set_bounds( &mut self, bounds: Size ) {
        self.bounds = bounds;
        self.clamp();
    }


    /// Returns true if the cell at `( x, y )` lies on the title bar.
    pub fn title_bar_contains( &self, x: i32, y: i32 ) -> bool {
        let GeometryState { position, size, visible, .. } = self.state;
        visible
            && y == position.y
            && x >= position.x
            && x < position.x + size.width
    }


    fn clamp( &mut self ) {
        let max_x = ( self.bounds.width - self.state.size.width ).max( 0 );
        let max_y = ( self.bounds.height - self.state.size.height ).max( 0 );
        self.state.position.x = self.state.position.x.clamp( 0, max_x );
        self.state.position.y = self.state.position.y.clamp( 0, max_y );
    }


    /// Returns a copy of the current state.
    pub fn state( &self ) -> GeometryState {
        self.state
    }


    /// Current containing bounds.
    pub fn bounds( &self ) -> Size {
        self.bounds
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    const BOUNDS: Size = Size::new( 120, 40 );


    fn inside( window: &WindowController ) -> bool {
        let GeometryState { position, size, .. } = window.state();
        position.x >= 0
            && position.y >= 0
            && position.x + size.width <= BOUNDS.width
            && position.y + size.height <= BOUNDS.height
    }


    #[test]
    fn test_starts_centered() {
        let window = WindowController::new( BOUNDS );
        assert_eq!( window.state().position, Position { x: 24, y: 10 } );
        assert!( inside( &window ) );
    }


    #[test]
    fn test_toggle_minimize_twice() {
        let mut window = WindowController::new( BOUNDS );
        let original = window.state();
        window.toggle_minimize();
        assert_eq!( window.state().size, MINIMIZED_SIZE );
        assert!( window.state().minimized );
        window.toggle_minimize();
        assert_eq!( window.state().size, original.size );
        assert!( !window.state().minimized );
    }


    #[test]
    fn test_drag_clamps() {
        let mut window = WindowController::new( BOUNDS );
        let requests = [
            Position { x: -50, y: -3 },
            Position { x: 500, y: 500 },
            Position { x: i32::MAX, y: i32::MIN },
            Position { x: 10, y: 5 },
        ];
        for request in requests {
            window.drag( request );
            assert!( inside( &window ), "escaped bounds for {:?}", request );
        }
        assert_eq!( window.state().position, Position { x: 10, y: 5 } );
    }


    #[test]
    fn test_drag_by_saturates() {
        let mut window = WindowController::new( BOUNDS );
        window.drag_by( i32::MAX, i32::MAX );
        assert_eq!( window.state().position, Position { x: 48, y: 20 } );
    }


    #[test]
    fn test_restore_reclamps() {
        let mut window = WindowController::new( BOUNDS );
        window.toggle_minimize();
        window.drag( Position { x: 200, y: 200 } );
        window.toggle_minimize();
        assert!( inside( &window ) );
    }


    #[test]
    fn test_close_only_hides() {
        let mut window = WindowController::new( BOUNDS );
        window.drag( Position { x: 3, y: 4 } );
        window.close();
        assert!( !window.state().visible );
        window.open();
        assert_eq!( window.state().position, Position { x: 3, y: 4 } );
    }


    #[test]
    fn test_shrinking_bounds() {
        let mut window = WindowController::new( BOUNDS );
        window.drag( Position { x: 48, y: 20 } );
        window.set_bounds( Size::new( 80, 24 ) );
        assert_eq!( window.state().position, Position { x: 8, y: 4 } );
    }
}
