pub mod prelude;

pub mod bookings;
pub mod cinemas;
pub mod cities;
pub mod genres;
pub mod languages;
pub mod movie_genres;
pub mod movie_languages;
pub mod movies;
pub mod seats;
pub mod slots;
pub mod tickets;
pub mod users;
